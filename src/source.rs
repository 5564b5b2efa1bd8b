//! Source abstraction for fetching batches of ranked market entries

use crate::{
    error::SourceError,
    types::{MarketEntry, Provenance},
};
use async_trait::async_trait;

/// Trait for market data sources
///
/// Each call is exactly one attempt: no retries, no backoff. Callers that
/// need a degrade chain compose sources through `FallbackResolver`.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetches one batch of entries ordered by capitalization rank
    ///
    /// # Arguments
    /// * `batch` - 1-based batch number (maps to the remote page index)
    /// * `batch_size` - Number of entries per batch
    ///
    /// # Returns
    /// The entries in rank order, or the tier's failure
    async fn fetch_batch(
        &self,
        batch: u32,
        batch_size: usize,
    ) -> Result<Vec<MarketEntry>, SourceError>;

    /// Returns the name of this source
    fn source_name(&self) -> &'static str;

    /// Returns the tier this source represents
    fn provenance(&self) -> Provenance;
}
