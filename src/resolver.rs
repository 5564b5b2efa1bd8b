//! Three-tier fallback resolver
//!
//! Tries the remote source, then the bundled snapshot, then the synthetic
//! generator, and returns the first non-empty result with its provenance.
//! The order is fixed. Tier failures are logged and never escape.

use crate::{
    config::FeedConfig,
    constants::BATCH_SIZE,
    error::{RemoteError, SourceError},
    metrics::{FeedMetrics, MetricsCollector},
    source::MarketDataSource,
    sources::{CoinGeckoSource, LocalSnapshot, SyntheticSource},
    types::{FeedEvent, FetchResult, Provenance},
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;

/// Resolver that degrades remote → local → synthetic
pub struct FallbackResolver {
    remote: Arc<dyn MarketDataSource>,
    local: Arc<dyn MarketDataSource>,
    synthetic: SyntheticSource,
    batch_size: usize,
    metrics: MetricsCollector,
    events: Option<broadcast::Sender<FeedEvent>>,
}

impl FallbackResolver {
    /// Creates a resolver over the given remote and local tiers
    pub fn new(remote: Arc<dyn MarketDataSource>, local: Arc<dyn MarketDataSource>) -> Self {
        let metrics = MetricsCollector::new(remote.source_name());
        Self {
            remote,
            local,
            synthetic: SyntheticSource::default(),
            batch_size: BATCH_SIZE,
            metrics,
            events: None,
        }
    }

    /// Creates the CoinGecko → snapshot → synthetic chain from config
    pub fn from_config(config: &FeedConfig) -> Result<Self, RemoteError> {
        let remote = Arc::new(CoinGeckoSource::new(config)?);
        let local = Arc::new(LocalSnapshot::new(config.snapshot.clone()));
        Ok(Self::new(remote, local))
    }

    /// Replaces the terminal placeholder generator
    pub fn with_synthetic(mut self, synthetic: SyntheticSource) -> Self {
        self.synthetic = synthetic;
        self
    }

    /// Publishes tier failures on the given channel
    pub fn with_events(mut self, events: broadcast::Sender<FeedEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Entries requested per batch
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Fetches one batch; always returns data
    pub async fn fetch(&self, batch: u32) -> FetchResult {
        let start = Instant::now();
        let remote = self.remote.fetch_batch(batch, self.batch_size).await;
        self.metrics
            .record_remote(start.elapsed(), matches!(&remote, Ok(e) if !e.is_empty()))
            .await;

        let result = match remote {
            Ok(entries) if !entries.is_empty() => {
                Some(FetchResult::new(batch, entries, Provenance::Remote))
            }
            other => {
                self.tier_failed(batch, self.remote.as_ref(), other.err());
                None
            }
        };

        let result = match result {
            Some(result) => result,
            None => match self.local.fetch_batch(batch, self.batch_size).await {
                Ok(entries) if !entries.is_empty() => {
                    FetchResult::new(batch, entries, Provenance::Local)
                }
                other => {
                    self.tier_failed(batch, self.local.as_ref(), other.err());
                    tracing::error!(batch, "Remote and local tiers failed, using synthetic data");
                    let entries = self.synthetic.generate(batch, self.batch_size);
                    FetchResult::new(batch, entries, Provenance::Synthetic)
                }
            },
        };

        self.metrics.record_resolution(result.provenance).await;
        tracing::info!(
            batch,
            provenance = %result.provenance,
            count = result.entries.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Resolved market batch"
        );

        result
    }

    fn tier_failed(
        &self,
        batch: u32,
        source: &dyn MarketDataSource,
        error: Option<SourceError>,
    ) {
        let message = error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "source returned no entries".to_string());

        tracing::warn!(
            batch,
            source = source.source_name(),
            provenance = %source.provenance(),
            error = %message,
            "Market data tier failed"
        );

        if let Some(events) = &self.events {
            // No subscribers is fine
            let _ = events.send(FeedEvent::tier_failed(batch, source.provenance(), message));
        }
    }

    /// Gets resolver metrics
    pub async fn get_metrics(&self) -> FeedMetrics {
        self.metrics.get_metrics().await
    }
}
