//! Bundled local snapshot source (tier 2)
//!
//! The snapshot is one fixed dataset. It ignores the batch number: every
//! request gets whatever entries the document holds, even if that is fewer
//! than a full batch.

use crate::{
    config::SnapshotLocation,
    error::{SnapshotError, SourceError},
    source::MarketDataSource,
    types::{MarketEntry, Provenance},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Snapshot document: a bare array or an envelope with a write timestamp
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotDocument {
    Envelope { data: Vec<MarketEntry> },
    Bare(Vec<MarketEntry>),
}

impl SnapshotDocument {
    fn into_entries(self) -> Vec<MarketEntry> {
        match self {
            SnapshotDocument::Envelope { data } => data,
            SnapshotDocument::Bare(entries) => entries,
        }
    }
}

#[derive(Debug, Serialize)]
struct SnapshotEnvelope<'a> {
    timestamp: DateTime<Utc>,
    data: &'a [MarketEntry],
}

/// Local snapshot source
pub struct LocalSnapshot {
    location: SnapshotLocation,
    client: reqwest::Client,
}

impl LocalSnapshot {
    /// Creates a snapshot source for a file or URL
    pub fn new(location: SnapshotLocation) -> Self {
        Self {
            location,
            client: reqwest::Client::new(),
        }
    }

    /// Reads and parses the whole snapshot
    pub async fn load(&self) -> Result<Vec<MarketEntry>, SnapshotError> {
        let body = match &self.location {
            SnapshotLocation::File(path) => tokio::fs::read_to_string(path).await?,
            SnapshotLocation::Url(url) => self.fetch_url(url).await?,
        };

        Self::parse(&body)
    }

    async fn fetch_url(&self, url: &str) -> Result<String, SnapshotError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SnapshotError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SnapshotError::Http(format!("HTTP {}", response.status())));
        }

        response
            .text()
            .await
            .map_err(|e| SnapshotError::Http(e.to_string()))
    }

    fn parse(body: &str) -> Result<Vec<MarketEntry>, SnapshotError> {
        let document: SnapshotDocument =
            serde_json::from_str(body).map_err(|e| SnapshotError::Malformed(e.to_string()))?;
        let entries = document.into_entries();

        if entries.is_empty() {
            return Err(SnapshotError::Empty);
        }

        Ok(entries)
    }

    /// Writes entries as a timestamped envelope, creating parent directories
    ///
    /// Used to refresh the bundled fallback from a good remote batch.
    pub async fn save(path: &Path, entries: &[MarketEntry]) -> Result<(), SnapshotError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let envelope = SnapshotEnvelope {
            timestamp: Utc::now(),
            data: entries,
        };
        let json = serde_json::to_string_pretty(&envelope)
            .map_err(|e| SnapshotError::Malformed(e.to_string()))?;
        tokio::fs::write(path, json).await?;

        tracing::info!(
            path = %path.display(),
            count = entries.len(),
            "Saved market snapshot"
        );
        Ok(())
    }
}

#[async_trait]
impl MarketDataSource for LocalSnapshot {
    async fn fetch_batch(
        &self,
        batch: u32,
        _batch_size: usize,
    ) -> Result<Vec<MarketEntry>, SourceError> {
        let entries = self.load().await?;
        tracing::debug!(batch, count = entries.len(), "Read local market snapshot");
        Ok(entries)
    }

    fn source_name(&self) -> &'static str {
        "local_snapshot"
    }

    fn provenance(&self) -> Provenance {
        Provenance::Local
    }
}
