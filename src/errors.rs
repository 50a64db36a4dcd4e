//! Error kinds for a sync run.
//!
//! Only [`SyncError::ConfigInvalid`], [`SyncError::ListFetchFailed`] and [`SyncError::Sink`] stop a
//! run. The per-item kinds are recovered where they occur and only surface as warnings.

use thiserror::Error;

/// Failure talking to the remote API (one request).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Failure of the fingerprint store. Never fatal: the reconciler treats it as a cache miss.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-position outcome of a content fetch that did not produce content.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("cancelled before the wave started")]
    Cancelled,
}

/// Error kinds of the ingestion pipeline.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
    #[error("listing campaigns failed: {0}")]
    ListFetchFailed(#[source] ApiError),
    #[error("campaign has no id{}", subject_suffix(.subject))]
    ItemMissingId { subject: Option<String> },
    #[error("content fetch failed for campaign {id}: {source}")]
    DetailFetchFailed {
        id: String,
        #[source]
        source: FetchError,
    },
    #[error("fingerprint cache unavailable: {0}")]
    CacheUnavailable(#[from] StoreError),
    #[error("output sink failed: {0}")]
    Sink(#[source] anyhow::Error),
    #[error("sync cancelled by user; {emitted} records were emitted before stopping")]
    Cancelled { emitted: usize },
}

fn subject_suffix(subject: &Option<String>) -> String {
    subject
        .as_deref()
        .map(|s| format!(": {s}"))
        .unwrap_or_default()
}

impl SyncError {
    /// True for kinds that abort the run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::ConfigInvalid(_)
                | SyncError::ListFetchFailed(_)
                | SyncError::Sink(_)
                | SyncError::Cancelled { .. }
        )
    }
}
