//! Fetch error taxonomy.
//!
//! A `FetchError` always means a whole source produced nothing usable.
//! Individually malformed entries never surface here; parsers skip them.

use std::time::Duration;

use paperwatch_common::error::CommonError;
use paperwatch_common::SourceTag;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    /// Network failure or non-success status, after the retry policy ran out.
    #[error("{0} upstream error: {1}")]
    Upstream(SourceTag, String),

    /// The response body as a whole could not be read.
    #[error("{0} returned an unreadable payload: {1}")]
    Parse(SourceTag, String),

    /// The source did not finish within its overall budget.
    #[error("{0} timed out after {1:?}")]
    Timeout(SourceTag, Duration),

    /// The HTTP client refused the request (allowlist or client construction).
    #[error("request blocked: {0}")]
    Blocked(#[from] CommonError),
}

impl FetchError {
    pub fn upstream(tag: SourceTag, err: impl std::fmt::Display) -> Self {
        FetchError::Upstream(tag, err.to_string())
    }

    pub fn parse(tag: SourceTag, err: impl std::fmt::Display) -> Self {
        FetchError::Parse(tag, err.to_string())
    }
}
