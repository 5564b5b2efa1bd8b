//! Append-only batch cache
//!
//! Holds every entry fetched this session in fetch order and the highest
//! contiguous batch number appended. There is no eviction: entries are never
//! removed or reordered once appended.

use crate::{error::PageError, types::MarketEntry};

/// Cumulative cache of fetched batches
#[derive(Debug, Default)]
pub struct BatchCache {
    entries: Vec<MarketEntry>,
    last_fetched_batch: u32,
}

impl BatchCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff batch `batch` has been appended
    pub fn has_batch(&self, batch: u32) -> bool {
        batch <= self.last_fetched_batch
    }

    /// Highest batch appended so far, 0 when empty
    pub fn last_fetched_batch(&self) -> u32 {
        self.last_fetched_batch
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been appended
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends the entries of `batch` to the tail
    ///
    /// # Returns
    /// `Ok(true)` when appended, `Ok(false)` when the batch is already held
    /// (nothing changes), or `NonContiguousBatch` when `batch` would leave a gap.
    pub fn append(&mut self, entries: Vec<MarketEntry>, batch: u32) -> Result<bool, PageError> {
        if self.has_batch(batch) {
            tracing::debug!(batch, "Batch already cached, skipping append");
            return Ok(false);
        }

        let expected = self.last_fetched_batch + 1;
        if batch != expected {
            return Err(PageError::non_contiguous(expected, batch));
        }

        self.entries.extend(entries);
        self.last_fetched_batch = batch;
        Ok(true)
    }

    /// Entries for `page` of `page_size`, possibly short or empty
    pub fn slice(&self, page: u32, page_size: usize) -> &[MarketEntry] {
        if page == 0 {
            return &[];
        }

        let start = ((page - 1) as usize).saturating_mul(page_size);
        let end = start.saturating_add(page_size).min(self.entries.len());
        if start >= end {
            return &[];
        }

        &self.entries[start..end]
    }

    /// Pages fully or partially covered by cached entries
    pub fn cached_pages(&self, page_size: usize) -> u32 {
        if page_size == 0 {
            return 0;
        }
        self.entries.len().div_ceil(page_size) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mock::{entry, ranked_batch};

    fn ranks(entries: &[MarketEntry]) -> Vec<u32> {
        entries.iter().map(|e| e.market_cap_rank).collect()
    }

    #[test]
    fn test_empty_cache() {
        let cache = BatchCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.last_fetched_batch(), 0);
        assert!(!cache.has_batch(1));
        assert!(cache.has_batch(0));
        assert!(cache.slice(1, 9).is_empty());
    }

    #[test]
    fn test_slice_after_first_batch() {
        let mut cache = BatchCache::new();
        assert!(cache.append(ranked_batch(1, 100), 1).unwrap());

        assert_eq!(ranks(cache.slice(1, 9)), (1..=9).collect::<Vec<_>>());
        // Page 12 spans ranks 100..108; only rank 100 is cached
        assert_eq!(ranks(cache.slice(12, 9)), vec![100]);
        assert!(cache.slice(13, 9).is_empty());
        assert!(cache.slice(0, 9).is_empty());
    }

    #[test]
    fn test_slice_across_batches() {
        let mut cache = BatchCache::new();
        cache.append(ranked_batch(1, 100), 1).unwrap();
        cache.append(ranked_batch(2, 100), 2).unwrap();

        assert_eq!(ranks(cache.slice(12, 9)), (100..=108).collect::<Vec<_>>());
        assert_eq!(cache.len(), 200);
        assert_eq!(cache.cached_pages(9), 23);
    }

    #[test]
    fn test_redundant_append_is_noop() {
        let mut cache = BatchCache::new();
        cache.append(ranked_batch(1, 100), 1).unwrap();

        assert!(!cache.append(ranked_batch(1, 100), 1).unwrap());
        assert_eq!(cache.len(), 100);
        assert_eq!(cache.last_fetched_batch(), 1);
    }

    #[test]
    fn test_gap_is_rejected() {
        let mut cache = BatchCache::new();
        let err = cache.append(ranked_batch(3, 100), 3).unwrap_err();

        assert_eq!(err, PageError::non_contiguous(1, 3));
        assert!(cache.is_empty());
        assert_eq!(cache.last_fetched_batch(), 0);
    }

    #[test]
    fn test_short_batch_keeps_order() {
        let mut cache = BatchCache::new();
        cache.append(vec![entry(1), entry(2)], 1).unwrap();
        cache.append(vec![entry(7)], 2).unwrap();

        assert_eq!(ranks(cache.slice(1, 9)), vec![1, 2, 7]);
        assert_eq!(cache.last_fetched_batch(), 2);
        assert_eq!(cache.cached_pages(9), 1);
    }
}
