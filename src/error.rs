//! Error types for the subscope library.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Bad input (subreddit name, sort, timeframe, limit). Rejected before
    /// any I/O and never retried.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A subreddit or post required as a lookup was absent from storage.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network failure, non-2xx status, or malformed JSON from the Reddit
    /// API, carrying the original cause.
    #[error("reddit request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// Query execution failure. Always aborts the current operation.
    #[error("storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
