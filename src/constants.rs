//! Constants for the market feed
//!
//! Defaults for every tier live here. `FeedConfig::from_env` can override the
//! network and snapshot settings at runtime; the paging geometry is fixed.

/// Number of entries requested per remote fetch
pub const BATCH_SIZE: usize = 100;

/// Number of entries shown per page
pub const COINS_PER_PAGE: usize = 9;

/// Highest batch a navigation may require (ranks up to 25,000)
pub const MAX_BATCH: u32 = 250;

/// HTTP request timeout when fetching a batch (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko endpoint for ranked market listings
pub const COINGECKO_MARKETS_ENDPOINT: &str = "/coins/markets";

/// Header carrying a CoinGecko demo API key
pub const COINGECKO_API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// Quote currency used for prices
pub const DEFAULT_VS_CURRENCY: &str = "usd";

/// Bundled fallback snapshot
pub const DEFAULT_SNAPSHOT_PATH: &str = "data/crypto_data_backup.json";

/// Capacity of the feed event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "market-feed/0.1.0";
