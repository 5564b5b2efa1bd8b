//! Fetch metrics collection and reporting
//!
//! Tracks remote latency percentiles and success rate, and how often the
//! resolver had to degrade to the local or synthetic tier.

use crate::types::Provenance;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::RwLock;

/// Maximum number of samples to keep for metrics calculation
const MAX_SAMPLES: usize = 100;

/// Metrics for the fallback chain
#[derive(Debug, Clone)]
pub struct FeedMetrics {
    /// Name of the remote source
    pub source_name: String,
    /// 50th percentile remote latency in milliseconds
    pub latency_p50_ms: f64,
    /// 99th percentile remote latency in milliseconds
    pub latency_p99_ms: f64,
    /// Remote success rate (0.0 to 1.0)
    pub remote_success_rate: f64,
    /// Total resolver fetches
    pub total_fetches: u64,
    /// Fetches served by the local snapshot
    pub local_fallbacks: u64,
    /// Fetches served by the synthetic generator
    pub synthetic_fallbacks: u64,
}

#[derive(Debug, Clone)]
struct LatencySample {
    duration_ms: f64,
    success: bool,
}

#[derive(Debug, Default)]
struct Counters {
    remote_attempts: u64,
    remote_failures: u64,
    total_fetches: u64,
    local_fallbacks: u64,
    synthetic_fallbacks: u64,
}

/// Collects and computes metrics for the resolver
pub struct MetricsCollector {
    source_name: String,
    /// Rolling window of remote latency samples
    samples: RwLock<VecDeque<LatencySample>>,
    counters: RwLock<Counters>,
}

impl MetricsCollector {
    /// Creates a new metrics collector for a remote source
    pub fn new(source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            samples: RwLock::new(VecDeque::with_capacity(MAX_SAMPLES)),
            counters: RwLock::new(Counters::default()),
        }
    }

    /// Records one remote attempt
    pub async fn record_remote(&self, duration: Duration, success: bool) {
        {
            let mut counters = self.counters.write().await;
            counters.remote_attempts += 1;
            if !success {
                counters.remote_failures += 1;
            }
        }

        let mut samples = self.samples.write().await;
        if samples.len() >= MAX_SAMPLES {
            samples.pop_front();
        }
        samples.push_back(LatencySample {
            duration_ms: duration.as_secs_f64() * 1000.0,
            success,
        });
    }

    /// Records which tier served a resolver fetch
    pub async fn record_resolution(&self, provenance: Provenance) {
        let mut counters = self.counters.write().await;
        counters.total_fetches += 1;
        match provenance {
            Provenance::Remote => {}
            Provenance::Local => counters.local_fallbacks += 1,
            Provenance::Synthetic => counters.synthetic_fallbacks += 1,
        }
    }

    /// Computes current metrics from collected samples
    pub async fn get_metrics(&self) -> FeedMetrics {
        let samples = self.samples.read().await;
        let counters = self.counters.read().await;

        let mut latencies: Vec<f64> = samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.duration_ms)
            .collect();
        latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let remote_success_rate = if counters.remote_attempts > 0 {
            (counters.remote_attempts - counters.remote_failures) as f64
                / counters.remote_attempts as f64
        } else {
            1.0
        };

        FeedMetrics {
            source_name: self.source_name.clone(),
            latency_p50_ms: percentile(&latencies, 50.0),
            latency_p99_ms: percentile(&latencies, 99.0),
            remote_success_rate,
            total_fetches: counters.total_fetches,
            local_fallbacks: counters.local_fallbacks,
            synthetic_fallbacks: counters.synthetic_fallbacks,
        }
    }
}

/// Calculate percentile from sorted values
fn percentile(sorted_values: &[f64], p: f64) -> f64 {
    if sorted_values.is_empty() {
        return 0.0;
    }

    let idx = (p / 100.0 * (sorted_values.len() - 1) as f64).round() as usize;
    sorted_values[idx.min(sorted_values.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_metrics_collector() {
        let collector = MetricsCollector::new("test");

        collector.record_remote(Duration::from_millis(100), true).await;
        collector.record_remote(Duration::from_millis(200), true).await;
        collector.record_remote(Duration::from_millis(150), false).await;
        collector.record_resolution(Provenance::Remote).await;
        collector.record_resolution(Provenance::Remote).await;
        collector.record_resolution(Provenance::Local).await;

        let metrics = collector.get_metrics().await;

        assert_eq!(metrics.source_name, "test");
        assert_eq!(metrics.total_fetches, 3);
        assert_eq!(metrics.local_fallbacks, 1);
        assert_eq!(metrics.synthetic_fallbacks, 0);
        assert!(metrics.remote_success_rate > 0.6 && metrics.remote_success_rate < 0.7);
        assert_eq!(metrics.latency_p99_ms, 200.0);
    }

    #[tokio::test]
    async fn test_empty_collector() {
        let metrics = MetricsCollector::new("idle").get_metrics().await;
        assert_eq!(metrics.total_fetches, 0);
        assert_eq!(metrics.remote_success_rate, 1.0);
        assert_eq!(metrics.latency_p50_ms, 0.0);
    }

    #[test]
    fn test_percentile() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        // Index round(0.5 * 9) = 5
        assert_eq!(percentile(&values, 50.0), 6.0);
        assert_eq!(percentile(&values, 99.0), 10.0);
    }
}
