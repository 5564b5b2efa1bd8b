//! CoinGecko market listing source (tier 1)

use crate::{
    config::FeedConfig,
    constants::{COINGECKO_API_KEY_HEADER, COINGECKO_MARKETS_ENDPOINT, USER_AGENT},
    error::{RemoteError, SourceError},
    source::MarketDataSource,
    types::{MarketEntry, Provenance},
};
use async_trait::async_trait;
use reqwest::Client;

/// CoinGecko `/coins/markets` source
///
/// Batch `k` of size `n` maps to `page=k&per_page=n` with results ordered by
/// market cap descending, so rank `(k-1)*n+1` comes first.
pub struct CoinGeckoSource {
    client: Client,
    base_url: String,
    proxy_url: Option<String>,
    api_key: Option<String>,
    vs_currency: String,
}

impl CoinGeckoSource {
    /// Creates a new CoinGecko source from the feed config
    pub fn new(config: &FeedConfig) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(RemoteError::NetworkError)?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            proxy_url: config.proxy_url.clone(),
            api_key: config.api_key.clone(),
            vs_currency: config.vs_currency.clone(),
        })
    }

    /// Builds the request URL for a batch, routed through the proxy if configured
    fn build_url(&self, batch: u32, batch_size: usize) -> String {
        let target = format!(
            "{}{}?vs_currency={}&order=market_cap_desc&per_page={}&page={}&sparkline=false&price_change_percentage=24h",
            self.base_url, COINGECKO_MARKETS_ENDPOINT, self.vs_currency, batch_size, batch
        );

        match &self.proxy_url {
            Some(proxy) => format!("{}{}", proxy, urlencoding::encode(&target)),
            None => target,
        }
    }

    /// Parses a markets response body
    fn parse_response(body: &str) -> Result<Vec<MarketEntry>, RemoteError> {
        let entries: Vec<MarketEntry> = serde_json::from_str(body).map_err(|e| {
            RemoteError::InvalidResponse(format!("Failed to parse CoinGecko response: {}", e))
        })?;

        if entries.is_empty() {
            return Err(RemoteError::InvalidResponse(
                "No entries returned from CoinGecko".to_string(),
            ));
        }

        Ok(entries)
    }

    async fn request_batch(
        &self,
        batch: u32,
        batch_size: usize,
    ) -> Result<Vec<MarketEntry>, RemoteError> {
        let url = self.build_url(batch, batch_size);
        tracing::debug!(batch, url = %url, "Fetching market batch from CoinGecko");

        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.header(COINGECKO_API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(RemoteError::from_request)?;

        // Check for rate limiting
        if response.status().as_u16() == 429 {
            return Err(RemoteError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            return Err(RemoteError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body = response.text().await.map_err(RemoteError::from_request)?;
        let entries = Self::parse_response(&body)?;

        tracing::debug!(
            batch,
            count = entries.len(),
            "Successfully fetched market batch from CoinGecko"
        );

        Ok(entries)
    }
}

#[async_trait]
impl MarketDataSource for CoinGeckoSource {
    async fn fetch_batch(
        &self,
        batch: u32,
        batch_size: usize,
    ) -> Result<Vec<MarketEntry>, SourceError> {
        Ok(self.request_batch(batch, batch_size).await?)
    }

    fn source_name(&self) -> &'static str {
        "coingecko"
    }

    fn provenance(&self) -> Provenance {
        Provenance::Remote
    }
}
