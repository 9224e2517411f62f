//! Publication source clients.

pub mod arxiv;
pub mod hugging_face;
pub mod papers_with_code;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use paperwatch_common::sandbox::SandboxClient;
use paperwatch_common::{FetchFilter, Record, SourceTag};
use tracing::warn;

use crate::error::FetchError;
use crate::rate_limit::RateLimiter;

/// Common interface for all publication source clients.
#[async_trait]
pub trait RecordSource: Send + Sync {
    fn tag(&self) -> SourceTag;

    /// Records published inside the filter's window, normalised to [`Record`].
    /// Malformed entries are skipped; an `Err` means the source as a whole failed.
    async fn fetch(&self, filter: &FetchFilter) -> Result<Vec<Record>, FetchError>;
}

/// How often a failed HTTP call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further attempt.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 2, backoff: Duration::from_secs(1) }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self { max_retries: 0, backoff: Duration::ZERO }
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << attempt.min(16))
    }
}

/// GET `url` and return the body, pacing every attempt through `limiter`.
///
/// Transport errors and 5xx responses are retried per `retry`; any other
/// non-success status fails straight away.
pub(crate) async fn get_text(
    tag: SourceTag,
    client: &SandboxClient,
    limiter: &RateLimiter,
    retry: &RetryPolicy,
    url: &str,
    query: &[(&str, String)],
) -> Result<String, FetchError> {
    let mut attempt = 0;
    loop {
        limiter.wait().await;
        let failure = match client.get(url)?.query(query).send().await {
            Ok(resp) if resp.status().is_success() => {
                return resp.text().await.map_err(|e| FetchError::upstream(tag, e));
            }
            Ok(resp) if resp.status().is_server_error() => format!("status {}", resp.status()),
            Ok(resp) => return Err(FetchError::Upstream(tag, format!("status {}", resp.status()))),
            Err(e) => e.to_string(),
        };

        if attempt >= retry.max_retries {
            return Err(FetchError::Upstream(tag, failure));
        }
        let delay = retry.delay(attempt);
        warn!(source = %tag, attempt = attempt + 1, error = %failure, ?delay, "Request failed, retrying");
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// RFC 3339 timestamps, or bare `YYYY-MM-DD` dates taken as midnight UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Collapse runs of whitespace (including newlines) to single spaces.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// String or number JSON identifiers, as both appear in the wild.
pub(crate) fn json_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
