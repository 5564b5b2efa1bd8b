//! Error types for the market feed

use thiserror::Error;

/// Errors from a single attempt against the remote market endpoint
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Invalid response from the endpoint
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Non-success status other than 429
    #[error("Provider API error: {0}")]
    ApiError(String),

    /// Timeout waiting for response
    #[error("Request timeout")]
    Timeout,
}

impl RemoteError {
    /// Maps a reqwest failure, keeping timeouts distinct
    pub fn from_request(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::NetworkError(err)
        }
    }
}

/// Errors reading the bundled snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Snapshot file could not be read or written
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot URL could not be fetched
    #[error("Snapshot request failed: {0}")]
    Http(String),

    /// Snapshot content is not a list of market entries
    #[error("Malformed snapshot: {0}")]
    Malformed(String),

    /// Snapshot parsed but holds no entries
    #[error("Snapshot contains no entries")]
    Empty,
}

/// Failure of one fallback tier
#[derive(Debug, Error)]
pub enum SourceError {
    /// Tier 1 failed
    #[error("Remote source unavailable: {0}")]
    RemoteUnavailable(#[from] RemoteError),

    /// Tier 2 failed
    #[error("Local snapshot unavailable: {0}")]
    LocalUnavailable(#[from] SnapshotError),
}

/// Errors surfaced by page navigation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PageError {
    /// Requested page is not a positive integer
    #[error("Invalid page: {input}")]
    InvalidPage { input: String },

    /// A batch arrived out of order; the controller's batch arithmetic is wrong
    #[error("Non-contiguous batch append: expected {expected}, got {got}")]
    NonContiguousBatch { expected: u32, got: u32 },
}

impl PageError {
    /// Creates an InvalidPage error
    pub fn invalid_page(input: impl Into<String>) -> Self {
        Self::InvalidPage {
            input: input.into(),
        }
    }

    /// Creates a NonContiguousBatch error
    pub fn non_contiguous(expected: u32, got: u32) -> Self {
        Self::NonContiguousBatch { expected, got }
    }
}
