//! Types for the market feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// One coin's market snapshot, shaped like a CoinGecko `/coins/markets` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEntry {
    /// Identifier, unique within a snapshot
    pub id: String,

    /// Ticker symbol (lowercase as served)
    pub symbol: String,

    /// Display name
    pub name: String,

    /// Logo URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Current price in the quote currency
    #[serde(deserialize_with = "null_as_zero")]
    pub current_price: f64,

    /// Market capitalization
    #[serde(deserialize_with = "null_as_zero")]
    pub market_cap: f64,

    /// Capitalization rank, 1 is the largest
    pub market_cap_rank: u32,

    /// 24h high
    #[serde(default, deserialize_with = "null_as_zero")]
    pub high_24h: f64,

    /// 24h low
    #[serde(default, deserialize_with = "null_as_zero")]
    pub low_24h: f64,

    /// 24h traded volume
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total_volume: f64,

    /// 24h price change percentage
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,

    /// Last updated timestamp
    pub last_updated: DateTime<Utc>,
}

impl MarketEntry {
    /// Returns the upper-cased ticker
    pub fn ticker(&self) -> String {
        self.symbol.to_uppercase()
    }

    /// True when the 24h change is known and non-negative
    pub fn is_gaining(&self) -> Option<bool> {
        self.price_change_percentage_24h.map(|change| change >= 0.0)
    }
}

/// CoinGecko serves `null` for numbers it has no value for
fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which fallback tier produced a fetch result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Live remote endpoint
    Remote,
    /// Bundled local snapshot
    Local,
    /// Generated placeholder data
    Synthetic,
}

impl Provenance {
    /// Get the provenance tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Remote => "remote",
            Provenance::Local => "local",
            Provenance::Synthetic => "synthetic",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entries for one batch together with the tier that produced them
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Batch number the entries were requested for
    pub batch: u32,
    /// Entries in source order
    pub entries: Vec<MarketEntry>,
    /// Tier that produced the entries
    pub provenance: Provenance,
    /// When the fetch completed
    pub fetched_at: DateTime<Utc>,
}

impl FetchResult {
    /// Creates a fetch result stamped with the current time
    pub fn new(batch: u32, entries: Vec<MarketEntry>, provenance: Provenance) -> Self {
        Self {
            batch,
            entries,
            provenance,
            fetched_at: Utc::now(),
        }
    }

    /// Timestamp reported by the data itself, falling back to the fetch time
    pub fn data_timestamp(&self) -> DateTime<Utc> {
        self.entries
            .first()
            .map(|entry| entry.last_updated)
            .unwrap_or(self.fetched_at)
    }
}

/// Observable state handed to the view layer
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    /// Entries visible on the current page
    pub entries: Vec<MarketEntry>,
    /// Current page, 1-based
    pub current_page: u32,
    /// True while a batch fetch is outstanding
    pub loading: bool,
    /// Last user-facing error, cleared by the next successful navigation
    pub error: Option<String>,
    /// Provenance of the most recent fetch
    pub provenance: Option<Provenance>,
    /// Data timestamp of the most recent fetch
    pub last_updated: Option<DateTime<Utc>>,
    /// When the most recent fetch completed
    pub fetched_at: Option<DateTime<Utc>>,
}

/// Feed events for subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedEvent {
    /// A batch was appended to the cache
    BatchFetched {
        id: Uuid,
        batch: u32,
        provenance: Provenance,
        count: usize,
        timestamp: DateTime<Utc>,
    },

    /// A fallback tier failed and the chain moved on
    TierFailed {
        id: Uuid,
        batch: u32,
        provenance: Provenance,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// The current page changed
    PageChanged {
        id: Uuid,
        page: u32,
        timestamp: DateTime<Utc>,
    },
}

impl FeedEvent {
    /// Creates a BatchFetched event for a fetch result
    pub fn batch_fetched(result: &FetchResult) -> Self {
        Self::BatchFetched {
            id: Uuid::new_v4(),
            batch: result.batch,
            provenance: result.provenance,
            count: result.entries.len(),
            timestamp: Utc::now(),
        }
    }

    /// Creates a TierFailed event
    pub fn tier_failed(batch: u32, provenance: Provenance, error_message: String) -> Self {
        Self::TierFailed {
            id: Uuid::new_v4(),
            batch,
            provenance,
            error_message,
            timestamp: Utc::now(),
        }
    }

    /// Creates a PageChanged event
    pub fn page_changed(page: u32) -> Self {
        Self::PageChanged {
            id: Uuid::new_v4(),
            page,
            timestamp: Utc::now(),
        }
    }

    /// Get the event type as string
    pub fn event_type(&self) -> &'static str {
        match self {
            FeedEvent::BatchFetched { .. } => "BATCH_FETCHED",
            FeedEvent::TierFailed { .. } => "TIER_FAILED",
            FeedEvent::PageChanged { .. } => "PAGE_CHANGED",
        }
    }
}

impl std::fmt::Display for FeedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedEvent::BatchFetched {
                batch,
                provenance,
                count,
                ..
            } => write!(f, "Batch {} fetched from {}: {} entries", batch, provenance, count),
            FeedEvent::TierFailed {
                batch,
                provenance,
                error_message,
                ..
            } => write!(
                f,
                "Tier {} failed for batch {}: {}",
                provenance, batch, error_message
            ),
            FeedEvent::PageChanged { page, .. } => write!(f, "Page changed to {}", page),
        }
    }
}

/// Overall feed health
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Serving live data
    Healthy,
    /// Serving the bundled snapshot
    Degraded,
    /// Serving placeholders or nothing
    Unhealthy,
}

impl From<Option<Provenance>> for HealthStatus {
    fn from(provenance: Option<Provenance>) -> Self {
        match provenance {
            Some(Provenance::Remote) => HealthStatus::Healthy,
            Some(Provenance::Local) => HealthStatus::Degraded,
            Some(Provenance::Synthetic) | None => HealthStatus::Unhealthy,
        }
    }
}

/// Component health information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional status message
    pub message: Option<String>,
    /// Component-specific details
    pub details: std::collections::HashMap<String, serde_json::Value>,
    /// Last checked timestamp
    pub last_checked: DateTime<Utc>,
}
