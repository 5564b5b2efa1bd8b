//! Runtime configuration for the feed's data tiers
//!
//! Defaults come from `constants`. `from_env` lets a deployment point the
//! remote tier at a proxy or mirror and swap the bundled snapshot.

use crate::constants::{
    COINGECKO_API_URL, DEFAULT_SNAPSHOT_PATH, DEFAULT_VS_CURRENCY, REQUEST_TIMEOUT_SECS,
};
use std::path::PathBuf;
use std::time::Duration;

/// Where the local snapshot lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotLocation {
    /// File on disk
    File(PathBuf),
    /// Static document served over HTTP
    Url(String),
}

impl SnapshotLocation {
    /// Interprets `http://` and `https://` values as URLs, anything else as a path
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            Self::Url(value.to_string())
        } else {
            Self::File(PathBuf::from(value))
        }
    }
}

/// Settings for the remote and local tiers
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Remote API base URL
    pub api_base_url: String,
    /// Optional proxy prefix; the encoded target URL is appended to it
    pub proxy_url: Option<String>,
    /// Optional demo API key
    pub api_key: Option<String>,
    /// Quote currency for prices
    pub vs_currency: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Tier 2 snapshot
    pub snapshot: SnapshotLocation,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_base_url: COINGECKO_API_URL.to_string(),
            proxy_url: None,
            api_key: None,
            vs_currency: DEFAULT_VS_CURRENCY.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            snapshot: SnapshotLocation::File(PathBuf::from(DEFAULT_SNAPSHOT_PATH)),
        }
    }
}

impl FeedConfig {
    /// Builds a config from the defaults plus `MARKET_FEED_*` environment overrides
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("MARKET_FEED_API_URL") {
            config.api_base_url = url.trim_end_matches('/').to_string();
        }
        config.proxy_url = non_empty("MARKET_FEED_PROXY_URL");
        config.api_key = non_empty("MARKET_FEED_API_KEY");
        if let Some(currency) = non_empty("MARKET_FEED_CURRENCY") {
            config.vs_currency = currency.to_lowercase();
        }
        if let Some(snapshot) = non_empty("MARKET_FEED_SNAPSHOT") {
            config.snapshot = SnapshotLocation::parse(&snapshot);
        }

        config
    }
}
