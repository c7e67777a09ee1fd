// src/ingest/error.rs
use thiserror::Error;

/// Failure to retrieve the listing page. Fatal to the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("building http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
}

/// Storage-layer failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("tool {0} not found")]
    NotFound(i64),
    #[error("store lock poisoned")]
    LockPoisoned,
    #[error("creating database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("store still in use")]
    InUse,
}

/// Failure while handling one candidate. Never aborts the run.
#[derive(Debug, Error)]
pub enum CandidateError {
    #[error("reconciling '{name}': {source}")]
    Reconcile {
        name: String,
        #[source]
        source: StoreError,
    },
}

/// Run-level failure; recorded as a `failed` run log.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("invalid source url '{0}'")]
    InvalidSource(String),
}
