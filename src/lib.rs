//! # Market Feed
//!
//! Paginated cryptocurrency market listings backed by an append-only batch
//! cache and a three-tier fallback chain.
//!
//! ## Data tiers
//!
//! Each batch of 100 ranked entries is resolved in a fixed order:
//!
//! 1. **remote**: CoinGecko `/coins/markets`
//! 2. **local**: a bundled JSON snapshot (bare array or `{ "data": [...] }`)
//! 3. **synthetic**: randomized placeholders, always succeeds
//!
//! The tier that answered is reported as [`Provenance`] on the fetch result
//! and in the controller's [`PageView`].
//!
//! ## Usage
//!
//! ```no_run
//! use market_feed::PaginationController;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let controller = PaginationController::new()?;
//!
//! let view = controller.go_to_page(1).await?;
//! println!("page {} from {:?}", view.current_page, view.provenance);
//!
//! // Page 12 needs ranks 100..108, so batch 2 is fetched first
//! let view = controller.go_to_page(12).await?;
//! for entry in &view.entries {
//!     println!("#{} {}: ${:.2}", entry.market_cap_rank, entry.ticker(), entry.current_price);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! PaginationController::go_to_page(n)
//!     ↓ needed batch = ceil(n * 9 / 100)
//! BatchCache::has_batch?
//!     ↓ missing
//! FallbackResolver::fetch(batch)
//!     ↓ CoinGeckoSource → LocalSnapshot → SyntheticSource
//! BatchCache::append → BatchCache::slice(n, 9)
//! ```
//!
//! ## Configuration
//!
//! Defaults live in [`constants`]. [`FeedConfig::from_env`] reads
//! `MARKET_FEED_API_URL`, `MARKET_FEED_PROXY_URL`, `MARKET_FEED_API_KEY`,
//! `MARKET_FEED_CURRENCY` and `MARKET_FEED_SNAPSHOT`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod resolver;
pub mod source;
pub mod sources;
pub mod types;

// Re-export commonly used types
pub use cache::BatchCache;
pub use config::{FeedConfig, SnapshotLocation};
pub use controller::{parse_page, PaginationController};
pub use error::{PageError, RemoteError, SnapshotError, SourceError};
pub use metrics::FeedMetrics;
pub use resolver::FallbackResolver;
pub use source::MarketDataSource;
pub use types::{
    ComponentHealth, FeedEvent, FetchResult, HealthStatus, MarketEntry, PageView, Provenance,
};
