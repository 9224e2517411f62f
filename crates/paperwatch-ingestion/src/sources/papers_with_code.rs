//! Papers with Code catalogue client.
//!
//! Uses the public REST API:
//!   https://paperswithcode.com/api/v1/papers/?ordering=-published
//!
//! One page, newest first. The API has no date or free-text parameters, so
//! both the window and the keyword filter are applied client-side.

use std::time::Duration;

use async_trait::async_trait;
use paperwatch_common::sandbox::SandboxClient;
use paperwatch_common::{FetchFilter, Record, SourceTag, TimeWindow};
use tracing::{debug, info, instrument};

use super::{collapse_whitespace, get_text, json_id, parse_timestamp, RecordSource, RetryPolicy};
use crate::error::FetchError;
use crate::rate_limit::RateLimiter;

pub const PWC_PAPERS_URL: &str = "https://paperswithcode.com/api/v1/papers/";

pub struct PapersWithCodeClient {
    client: SandboxClient,
    limiter: RateLimiter,
    retry: RetryPolicy,
    base_url: String,
    page_size: usize,
}

impl PapersWithCodeClient {
    pub fn new(limiter: RateLimiter, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: SandboxClient::with_timeout(timeout)?,
            limiter,
            retry: RetryPolicy::default(),
            base_url: PWC_PAPERS_URL.to_string(),
            page_size: 100,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[async_trait]
impl RecordSource for PapersWithCodeClient {
    fn tag(&self) -> SourceTag {
        SourceTag::PapersWithCode
    }

    #[instrument(skip(self, filter), fields(source = "papers_with_code"))]
    async fn fetch(&self, filter: &FetchFilter) -> Result<Vec<Record>, FetchError> {
        let window = filter.window();
        let params = [
            ("ordering", "-published".to_string()),
            ("items_per_page", self.page_size.to_string()),
        ];
        let body = get_text(
            SourceTag::PapersWithCode,
            &self.client,
            &self.limiter,
            &self.retry,
            &self.base_url,
            &params,
        )
        .await?;

        let records: Vec<Record> = parse_papers(&body, window)?
            .into_iter()
            .filter(|r| filter.matches_keywords(r))
            .collect();
        info!(count = records.len(), "Papers with Code fetch complete");
        Ok(records)
    }
}

/// Parse a `/papers/` response and keep the items published inside `window`.
pub fn parse_papers(body: &str, window: TimeWindow) -> Result<Vec<Record>, FetchError> {
    let resp: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FetchError::parse(SourceTag::PapersWithCode, e))?;
    let Some(results) = resp["results"].as_array() else {
        return Err(FetchError::parse(SourceTag::PapersWithCode, "missing `results` array"));
    };

    debug!(fetched = results.len(), "Papers with Code API response");

    let records = results
        .iter()
        .filter_map(|item| {
            let rec = parse_item(item);
            if rec.is_none() {
                debug!(id = ?item["id"], "Skipping Papers with Code item without id, title or publication date");
            }
            rec
        })
        .filter(|r| window.contains(r.published_at))
        .collect();
    Ok(records)
}

fn parse_item(item: &serde_json::Value) -> Option<Record> {
    let published = parse_timestamp(item["published"].as_str()?)?;
    let local_id = json_id(&item["id"]).or_else(|| json_id(&item["arxiv_id"]))?;
    let title = collapse_whitespace(item["title"].as_str().unwrap_or(""));
    if title.is_empty() {
        return None;
    }

    let mut rec = Record::new(
        SourceTag::PapersWithCode.qualify(&local_id),
        title,
        SourceTag::PapersWithCode,
        published,
    );
    rec.authors = item["authors"]
        .as_array()
        .map(|names| {
            names
                .iter()
                .filter_map(|n| n.as_str())
                .map(collapse_whitespace)
                .filter(|n| !n.is_empty())
                .collect()
        })
        .unwrap_or_default();
    rec.abstract_text = collapse_whitespace(item["abstract"].as_str().unwrap_or(""));
    rec.url = item["url_abs"].as_str().unwrap_or("").to_string();
    rec.pdf_url = item["url_pdf"].as_str().filter(|u| !u.is_empty()).map(String::from);
    Some(rec)
}
