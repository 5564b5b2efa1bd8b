//! Market data source implementations, one per fallback tier

pub mod coingecko;
pub mod snapshot;
pub mod synthetic;

pub use coingecko::CoinGeckoSource;
pub use snapshot::LocalSnapshot;
pub use synthetic::SyntheticSource;
