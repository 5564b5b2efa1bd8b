//! Pagination controller
//!
//! Turns page navigation into batch fetches and exposes the visible slice
//! as observable state for a view layer.
//!
//! Fetches are serialised: at most one batch request is in flight, and
//! navigation that arrives meanwhile waits its turn. Each navigation takes a
//! sequence number; when a fetch completes after a newer navigation was
//! issued, its batch is still committed to the cache but the current page is
//! left for the newer request to set.

use crate::{
    cache::BatchCache,
    config::FeedConfig,
    constants::{COINS_PER_PAGE, EVENT_CHANNEL_CAPACITY, MAX_BATCH},
    error::{PageError, RemoteError, SnapshotError},
    metrics::FeedMetrics,
    resolver::FallbackResolver,
    sources::LocalSnapshot,
    types::{ComponentHealth, FeedEvent, HealthStatus, MarketEntry, PageView, Provenance},
};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{broadcast, Mutex, RwLock};

/// Parses a page number typed by a user
pub fn parse_page(input: &str) -> Result<u32, PageError> {
    input
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|page| *page >= 1)
        .ok_or_else(|| PageError::invalid_page(input.trim()))
}

/// Batch that must be cached before `page` can be shown
pub fn batch_for_page(page: u32, coins_per_page: usize, batch_size: usize) -> u32 {
    let last_index = page as u64 * coins_per_page as u64;
    last_index.div_ceil(batch_size.max(1) as u64) as u32
}

/// Holds `loading` high while alive, so a dropped navigation future clears it
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct ViewState {
    current_page: u32,
    entries: Vec<MarketEntry>,
    error: Option<String>,
    provenance: Option<Provenance>,
    last_updated: Option<DateTime<Utc>>,
    fetched_at: Option<DateTime<Utc>>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            current_page: 1,
            entries: Vec::new(),
            error: None,
            provenance: None,
            last_updated: None,
            fetched_at: None,
        }
    }
}

/// Page navigation over the batch cache
///
/// # Example
/// ```no_run
/// use market_feed::PaginationController;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let controller = PaginationController::new()?;
/// let view = controller.go_to_page(1).await?;
/// for entry in &view.entries {
///     println!("#{} {}: ${:.2}", entry.market_cap_rank, entry.ticker(), entry.current_price);
/// }
/// # Ok(())
/// # }
/// ```
pub struct PaginationController {
    resolver: FallbackResolver,
    cache: RwLock<BatchCache>,
    state: RwLock<ViewState>,
    fetch_gate: Mutex<()>,
    loading: AtomicBool,
    navigation_seq: AtomicU64,
    coins_per_page: usize,
    events: broadcast::Sender<FeedEvent>,
}

impl PaginationController {
    /// Creates a controller over the CoinGecko → snapshot → synthetic chain
    ///
    /// Settings come from `FeedConfig::from_env`.
    pub fn new() -> Result<Self, RemoteError> {
        let resolver = FallbackResolver::from_config(&FeedConfig::from_env())?;
        Ok(Self::with_resolver(resolver))
    }

    /// Creates a controller with a custom resolver
    pub fn with_resolver(resolver: FallbackResolver) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            resolver: resolver.with_events(events.clone()),
            cache: RwLock::new(BatchCache::new()),
            state: RwLock::new(ViewState::default()),
            fetch_gate: Mutex::new(()),
            loading: AtomicBool::new(false),
            navigation_seq: AtomicU64::new(0),
            coins_per_page: COINS_PER_PAGE,
            events,
        }
    }

    /// Navigates to `target`, fetching missing batches first
    ///
    /// Every batch from `last_fetched_batch + 1` up to the one covering
    /// `target` is fetched in order. Pages whose batch lies beyond
    /// `MAX_BATCH` are rejected as `InvalidPage`.
    ///
    /// # Returns
    /// The resulting view. If a newer navigation was issued while this one
    /// was fetching, the view reflects that navigation's page instead.
    pub async fn go_to_page(&self, target: i64) -> Result<PageView, PageError> {
        let batch_size = self.resolver.batch_size();
        let page_and_batch = u32::try_from(target)
            .ok()
            .filter(|page| *page >= 1)
            .map(|page| (page, batch_for_page(page, self.coins_per_page, batch_size)))
            .filter(|(_, batch)| *batch <= MAX_BATCH);
        let Some((page, needed)) = page_and_batch else {
            let err = PageError::invalid_page(target.to_string());
            self.state.write().await.error = Some(err.to_string());
            return Err(err);
        };

        let seq = self.navigation_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let _gate = self.fetch_gate.lock().await;
        self.fetch_through(needed).await?;

        if self.navigation_seq.load(Ordering::SeqCst) != seq {
            tracing::debug!(page, "Navigation superseded, leaving current page unchanged");
            return Ok(self.state().await);
        }

        let entries = self
            .cache
            .read()
            .await
            .slice(page, self.coins_per_page)
            .to_vec();
        {
            let mut state = self.state.write().await;
            state.current_page = page;
            state.entries = entries;
            state.error = None;
        }
        let _ = self.events.send(FeedEvent::page_changed(page));

        Ok(self.state().await)
    }

    /// Parses view-layer input and navigates to it
    pub async fn goto_page_input(&self, input: &str) -> Result<PageView, PageError> {
        match parse_page(input) {
            Ok(page) => self.go_to_page(page as i64).await,
            Err(err) => {
                self.state.write().await.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Navigates to the page after the current one
    pub async fn next_page(&self) -> Result<PageView, PageError> {
        let current = self.current_page().await;
        self.go_to_page(current as i64 + 1).await
    }

    /// Navigates to the page before the current one; no-op on page 1
    pub async fn prev_page(&self) -> Result<PageView, PageError> {
        let current = self.current_page().await;
        if current <= 1 {
            return Ok(self.state().await);
        }
        self.go_to_page(current as i64 - 1).await
    }

    /// Navigates to page 1
    pub async fn first_page(&self) -> Result<PageView, PageError> {
        self.go_to_page(1).await
    }

    /// Fetches and appends batches until `needed` is cached
    ///
    /// Caller must hold the fetch gate. `loading` stays high from the first
    /// fetch until this returns or is dropped.
    async fn fetch_through(&self, needed: u32) -> Result<(), PageError> {
        let mut loading: Option<LoadingGuard<'_>> = None;
        loop {
            let next = {
                let cache = self.cache.read().await;
                if cache.has_batch(needed) {
                    return Ok(());
                }
                cache.last_fetched_batch() + 1
            };

            loading.get_or_insert_with(|| LoadingGuard::raise(&self.loading));
            let result = self.resolver.fetch(next).await;

            let appended = self
                .cache
                .write()
                .await
                .append(result.entries.clone(), result.batch);
            if let Err(err) = appended {
                tracing::error!(error = %err, "Batch cache rejected append");
                self.state.write().await.error = Some(err.to_string());
                return Err(err);
            }

            {
                let mut state = self.state.write().await;
                state.provenance = Some(result.provenance);
                state.last_updated = Some(result.data_timestamp());
                state.fetched_at = Some(result.fetched_at);
            }
            let _ = self.events.send(FeedEvent::batch_fetched(&result));
        }
    }

    /// Current observable state
    pub async fn state(&self) -> PageView {
        let state = self.state.read().await;
        PageView {
            entries: state.entries.clone(),
            current_page: state.current_page,
            loading: self.is_loading(),
            error: state.error.clone(),
            provenance: state.provenance,
            last_updated: state.last_updated,
            fetched_at: state.fetched_at,
        }
    }

    /// Current page, 1-based
    pub async fn current_page(&self) -> u32 {
        self.state.read().await.current_page
    }

    /// True while a batch fetch is outstanding
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Highest batch appended to the cache
    pub async fn last_fetched_batch(&self) -> u32 {
        self.cache.read().await.last_fetched_batch()
    }

    /// Number of cached entries
    pub async fn cached_entries(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Pages that can be shown without another fetch
    pub async fn cached_pages(&self) -> u32 {
        self.cache.read().await.cached_pages(self.coins_per_page)
    }

    /// Subscribes to feed events
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }

    /// Gets resolver metrics
    pub async fn get_metrics(&self) -> FeedMetrics {
        self.resolver.get_metrics().await
    }

    /// Writes every cached entry to a snapshot file usable as the local tier
    ///
    /// # Returns
    /// Number of entries written
    pub async fn export_snapshot(&self, path: &Path) -> Result<usize, SnapshotError> {
        let cache = self.cache.read().await;
        if cache.is_empty() {
            return Err(SnapshotError::Empty);
        }
        let entries = cache.slice(1, cache.len());
        LocalSnapshot::save(path, entries).await?;
        Ok(entries.len())
    }

    /// Perform a health check on the feed
    ///
    /// # Returns
    /// ComponentHealth derived from the provenance of the latest fetch
    pub async fn health_check(&self) -> ComponentHealth {
        let mut details = std::collections::HashMap::new();
        let view = self.state().await;
        let metrics = self.get_metrics().await;

        details.insert(
            "cached_entries".to_string(),
            serde_json::json!(self.cached_entries().await),
        );
        details.insert(
            "last_fetched_batch".to_string(),
            serde_json::json!(self.last_fetched_batch().await),
        );
        details.insert(
            "current_page".to_string(),
            serde_json::json!(view.current_page),
        );
        details.insert(
            "provenance".to_string(),
            serde_json::json!(view.provenance.map(|p| p.as_str())),
        );
        details.insert(
            "local_fallbacks".to_string(),
            serde_json::json!(metrics.local_fallbacks),
        );
        details.insert(
            "synthetic_fallbacks".to_string(),
            serde_json::json!(metrics.synthetic_fallbacks),
        );

        let status = HealthStatus::from(view.provenance);
        let message = match (&status, view.provenance) {
            (HealthStatus::Healthy, _) => "Market feed is serving live data".to_string(),
            (HealthStatus::Degraded, _) => "Market feed is serving the local snapshot".to_string(),
            (HealthStatus::Unhealthy, Some(_)) => {
                "Market feed is serving synthetic placeholders".to_string()
            }
            (HealthStatus::Unhealthy, None) => "Market feed has not fetched any data".to_string(),
        };

        ComponentHealth {
            name: "market_feed".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::BATCH_SIZE;
    use crate::source::mock::{entry, MockOutcome, MockSource};
    use std::sync::Arc;
    use std::time::Duration;

    fn controller_with(
        remote: MockSource,
        local: MockSource,
    ) -> (Arc<PaginationController>, Arc<MockSource>) {
        let remote = Arc::new(remote);
        let resolver = FallbackResolver::new(remote.clone(), Arc::new(local));
        (Arc::new(PaginationController::with_resolver(resolver)), remote)
    }

    fn ranked_controller() -> (Arc<PaginationController>, Arc<MockSource>) {
        controller_with(MockSource::ranked(), MockSource::failing(Provenance::Local))
    }

    fn ranks(view: &PageView) -> Vec<u32> {
        view.entries.iter().map(|e| e.market_cap_rank).collect()
    }

    #[test]
    fn test_batch_for_page() {
        assert_eq!(batch_for_page(1, 9, 100), 1);
        assert_eq!(batch_for_page(11, 9, 100), 1);
        assert_eq!(batch_for_page(12, 9, 100), 2);
        assert_eq!(batch_for_page(34, 9, 100), 4);
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(" 12 "), Ok(12));
        assert!(parse_page("0").is_err());
        assert!(parse_page("-5").is_err());
        assert!(parse_page("abc").is_err());
        assert!(parse_page("2.5").is_err());
        assert!(parse_page("").is_err());
    }

    #[tokio::test]
    async fn test_fetch_counts_follow_batches() {
        let (controller, remote) = ranked_controller();

        let view = controller.go_to_page(1).await.unwrap();
        assert_eq!(ranks(&view), (1..=9).collect::<Vec<_>>());
        assert_eq!(remote.call_count(), 1);

        controller.go_to_page(9).await.unwrap();
        assert_eq!(remote.call_count(), 1);

        let view = controller.go_to_page(12).await.unwrap();
        assert_eq!(remote.requested_batches(), vec![1, 2]);
        assert_eq!(ranks(&view), (100..=108).collect::<Vec<_>>());
        assert_eq!(view.current_page, 12);
        assert_eq!(view.provenance, Some(Provenance::Remote));
        assert!(view.fetched_at.is_some());
        assert!(!view.loading);
    }

    #[tokio::test]
    async fn test_invalid_pages_leave_state_unchanged() {
        let (controller, remote) = ranked_controller();
        controller.go_to_page(3).await.unwrap();

        for target in [0, -5] {
            let err = controller.go_to_page(target).await.unwrap_err();
            assert!(matches!(err, PageError::InvalidPage { .. }));
        }
        let err = controller.goto_page_input("abc").await.unwrap_err();
        assert_eq!(err, PageError::invalid_page("abc"));

        let view = controller.state().await;
        assert_eq!(view.current_page, 3);
        assert!(view.error.is_some());
        assert_eq!(controller.last_fetched_batch().await, 1);
        assert_eq!(controller.cached_entries().await, BATCH_SIZE);
        assert_eq!(remote.call_count(), 1);

        // A valid navigation clears the error
        let view = controller.go_to_page(4).await.unwrap();
        assert!(view.error.is_none());
    }

    #[tokio::test]
    async fn test_pages_beyond_last_batch_are_rejected() {
        let (controller, remote) = ranked_controller();
        let last_page = (MAX_BATCH as usize * BATCH_SIZE / COINS_PER_PAGE) as i64;
        assert_eq!(
            batch_for_page(last_page as u32, COINS_PER_PAGE, BATCH_SIZE),
            MAX_BATCH
        );

        let err = controller.go_to_page(last_page + 1).await.unwrap_err();
        assert!(matches!(err, PageError::InvalidPage { .. }));
        let err = controller.goto_page_input("100000").await.unwrap_err();
        assert_eq!(err, PageError::invalid_page("100000"));
        assert!(controller.go_to_page(i64::MAX).await.is_err());

        assert_eq!(remote.call_count(), 0);
        assert_eq!(controller.current_page().await, 1);
        assert_eq!(controller.last_fetched_batch().await, 0);
    }

    #[tokio::test]
    async fn test_cancelled_navigation_clears_loading() {
        let (controller, remote) = controller_with(
            MockSource::ranked().with_delay(Duration::from_millis(100)),
            MockSource::failing(Provenance::Local),
        );
        controller.go_to_page(1).await.unwrap();

        let cancelled =
            tokio::time::timeout(Duration::from_millis(20), controller.go_to_page(12)).await;
        assert!(cancelled.is_err());
        assert!(!controller.is_loading());

        let view = controller.go_to_page(2).await.unwrap();
        assert!(!view.loading);
        assert_eq!(view.current_page, 2);
        assert_eq!(controller.last_fetched_batch().await, 1);
        assert_eq!(remote.requested_batches(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_loading_held_across_multi_batch_jump() {
        let (controller, _) = controller_with(
            MockSource::ranked().with_delay(Duration::from_millis(30)),
            MockSource::failing(Provenance::Local),
        );

        let jump = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.go_to_page(34).await })
        };
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if controller.last_fetched_batch().await == 4 {
                break;
            }
            assert!(controller.is_loading());
        }

        jump.await.unwrap().unwrap();
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn test_jump_fetches_every_missing_batch() {
        let (controller, remote) = ranked_controller();

        let view = controller.go_to_page(34).await.unwrap();

        assert_eq!(remote.requested_batches(), vec![1, 2, 3, 4]);
        assert_eq!(controller.last_fetched_batch().await, 4);
        assert_eq!(ranks(&view), (298..=306).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_last_fetched_batch_is_monotonic() {
        let (controller, _) = ranked_controller();
        let mut last = 0;

        for page in [5, 12, 2, 30, 1, 23, 0, 7] {
            let _ = controller.go_to_page(page).await;
            let now = controller.last_fetched_batch().await;
            assert!(now >= last);
            if page >= 1 {
                assert!(now >= batch_for_page(page as u32, COINS_PER_PAGE, BATCH_SIZE));
            }
            last = now;
        }
    }

    #[tokio::test]
    async fn test_next_and_prev() {
        let (controller, _) = ranked_controller();

        let view = controller.prev_page().await.unwrap();
        assert_eq!(view.current_page, 1);
        assert!(view.entries.is_empty());

        controller.first_page().await.unwrap();
        let view = controller.next_page().await.unwrap();
        assert_eq!(view.current_page, 2);
        assert_eq!(ranks(&view), (10..=18).collect::<Vec<_>>());

        let view = controller.prev_page().await.unwrap();
        assert_eq!(view.current_page, 1);
        let view = controller.prev_page().await.unwrap();
        assert_eq!(view.current_page, 1);
    }

    #[tokio::test]
    async fn test_degraded_tiers_fill_pages() {
        let snapshot: Vec<_> = (1..=10).map(entry).collect();
        let (controller, _) = controller_with(
            MockSource::failing(Provenance::Remote),
            MockSource::new(Provenance::Local, MockOutcome::Fixed(snapshot)),
        );

        let view = controller.go_to_page(2).await.unwrap();
        assert_eq!(view.provenance, Some(Provenance::Local));
        assert_eq!(ranks(&view), vec![10]);
        assert_eq!(controller.cached_pages().await, 2);

        let health = controller.health_check().await;
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.details["cached_entries"], 10);
    }

    #[tokio::test]
    async fn test_synthetic_when_everything_fails() {
        let (controller, _) = controller_with(
            MockSource::failing(Provenance::Remote),
            MockSource::failing(Provenance::Local),
        );

        let view = controller.go_to_page(1).await.unwrap();
        assert_eq!(view.provenance, Some(Provenance::Synthetic));
        assert!(!view.entries.is_empty());
        assert!(view.last_updated.is_some());
        assert_eq!(controller.health_check().await.status, HealthStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_superseded_fetch_still_commits() {
        let (controller, remote) = controller_with(
            MockSource::ranked().with_delay(Duration::from_millis(50)),
            MockSource::failing(Provenance::Local),
        );

        let slow = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.go_to_page(12).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(controller.is_loading());

        let view = controller.go_to_page(2).await.unwrap();
        let superseded = slow.await.unwrap().unwrap();

        assert_eq!(view.current_page, 2);
        assert_eq!(ranks(&view), (10..=18).collect::<Vec<_>>());
        // The jump to page 12 never became current
        assert_eq!(superseded.current_page, 1);
        assert_eq!(controller.current_page().await, 2);
        assert_eq!(controller.last_fetched_batch().await, 2);
        assert_eq!(remote.requested_batches(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_events_published() {
        let (controller, _) = ranked_controller();
        let mut rx = controller.subscribe();

        controller.go_to_page(1).await.unwrap();

        let fetched = rx.recv().await.unwrap();
        assert!(matches!(
            fetched,
            FeedEvent::BatchFetched { batch: 1, count: 100, provenance: Provenance::Remote, .. }
        ));
        let changed = rx.recv().await.unwrap();
        assert!(matches!(changed, FeedEvent::PageChanged { page: 1, .. }));
    }

    #[tokio::test]
    async fn test_export_snapshot() {
        let (controller, _) = ranked_controller();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        assert!(matches!(
            controller.export_snapshot(&path).await,
            Err(SnapshotError::Empty)
        ));

        controller.go_to_page(1).await.unwrap();
        assert_eq!(controller.export_snapshot(&path).await.unwrap(), BATCH_SIZE);

        let snapshot = LocalSnapshot::new(crate::config::SnapshotLocation::File(path));
        assert_eq!(snapshot.load().await.unwrap().len(), BATCH_SIZE);
    }
}
