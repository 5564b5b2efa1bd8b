//! Synthetic placeholder source (tier 3)
//!
//! Never fails. Values are randomized around fixed anchors so the view has
//! something plausible to render; they are not market data.

use crate::types::MarketEntry;
use chrono::Utc;
use rand::Rng;

const BASE_PRICE: f64 = 45_000.0;
const PRICE_SPREAD: f64 = 5_000.0;
const MAX_CHANGE_PCT: f64 = 5.0;
const PLACEHOLDER_MARKET_CAP: f64 = 880_000_000_000.0;
const PLACEHOLDER_VOLUME: f64 = 25_000_000_000.0;
const PLACEHOLDER_IMAGE: &str = "https://assets.coingecko.com/coins/images/1/small/bitcoin.png";

/// Synthetic placeholder source
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    entries_per_batch: usize,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new(1)
    }
}

impl SyntheticSource {
    /// Creates a generator producing `entries_per_batch` placeholders (at least one)
    pub fn new(entries_per_batch: usize) -> Self {
        Self {
            entries_per_batch: entries_per_batch.max(1),
        }
    }

    /// Generates placeholders ranked from the start of `batch`
    pub fn generate(&self, batch: u32, batch_size: usize) -> Vec<MarketEntry> {
        let mut rng = rand::thread_rng();
        let batch_size = u32::try_from(batch_size).unwrap_or(u32::MAX);
        let first_rank = batch
            .saturating_sub(1)
            .saturating_mul(batch_size)
            .saturating_add(1);
        let count = (self.entries_per_batch as u32).min(batch_size.max(1));

        (0..count)
            .map(|offset| {
                let rank = first_rank.saturating_add(offset);
                let price = BASE_PRICE + rng.gen::<f64>() * PRICE_SPREAD;
                MarketEntry {
                    id: format!("unknown-coin-{}", rank),
                    symbol: "unk".to_string(),
                    name: "Unknown Coin".to_string(),
                    image: Some(PLACEHOLDER_IMAGE.to_string()),
                    current_price: price,
                    market_cap: PLACEHOLDER_MARKET_CAP,
                    market_cap_rank: rank,
                    high_24h: BASE_PRICE + PRICE_SPREAD,
                    low_24h: BASE_PRICE - PRICE_SPREAD / 5.0,
                    total_volume: PLACEHOLDER_VOLUME,
                    price_change_percentage_24h: Some(
                        rng.gen_range(-MAX_CHANGE_PCT..MAX_CHANGE_PCT),
                    ),
                    last_updated: Utc::now(),
                }
            })
            .collect()
    }
}
