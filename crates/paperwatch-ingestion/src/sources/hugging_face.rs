//! Hugging Face daily papers client.
//!
//! Endpoint: https://huggingface.co/api/daily_papers (single JSON array)
//!
//! The feed is same-day curated content: an item without a timestamp is
//! taken as published now, and engagement is the upvote counter.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paperwatch_common::sandbox::SandboxClient;
use paperwatch_common::{FetchFilter, Record, SourceTag};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::{collapse_whitespace, get_text, json_id, parse_timestamp, RecordSource, RetryPolicy};
use crate::error::FetchError;
use crate::rate_limit::RateLimiter;

pub const HF_DAILY_PAPERS_URL: &str = "https://huggingface.co/api/daily_papers";

pub struct HuggingFaceClient {
    client: SandboxClient,
    limiter: RateLimiter,
    retry: RetryPolicy,
    base_url: String,
}

impl HuggingFaceClient {
    pub fn new(limiter: RateLimiter, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: SandboxClient::with_timeout(timeout)?,
            limiter,
            retry: RetryPolicy::default(),
            base_url: HF_DAILY_PAPERS_URL.to_string(),
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
}

#[async_trait]
impl RecordSource for HuggingFaceClient {
    fn tag(&self) -> SourceTag {
        SourceTag::HuggingFace
    }

    #[instrument(skip(self, filter), fields(source = "hugging_face"))]
    async fn fetch(&self, filter: &FetchFilter) -> Result<Vec<Record>, FetchError> {
        let now = Utc::now();
        let window = filter.window_at(now);
        let body = get_text(SourceTag::HuggingFace, &self.client, &self.limiter, &self.retry, &self.base_url, &[])
            .await?;

        // Only the lower bound applies: undated items are stamped "now",
        // which is never before the window start.
        let records: Vec<Record> = parse_daily_papers(&body, now)?
            .into_iter()
            .filter(|r| r.published_at >= window.start)
            .filter(|r| filter.matches_keywords(r))
            .collect();
        info!(count = records.len(), "Hugging Face fetch complete");
        Ok(records)
    }
}

/// Parse the daily papers array. `now` stands in for missing timestamps.
///
/// Items come either flat or wrapped as `{ "paper": { … } }`; fields are
/// looked up on the item first, then on the nested paper.
pub fn parse_daily_papers(body: &str, now: DateTime<Utc>) -> Result<Vec<Record>, FetchError> {
    let items: Vec<Value> =
        serde_json::from_str(body).map_err(|e| FetchError::parse(SourceTag::HuggingFace, e))?;
    debug!(fetched = items.len(), "Hugging Face API response");

    Ok(items
        .iter()
        .filter_map(|item| {
            let rec = parse_item(item, now);
            if rec.is_none() {
                debug!(id = ?field(item, "id"), "Skipping malformed Hugging Face item");
            }
            rec
        })
        .collect())
}

fn field<'a>(item: &'a Value, key: &str) -> &'a Value {
    match &item[key] {
        Value::Null => &item["paper"][key],
        v => v,
    }
}

fn parse_item(item: &Value, now: DateTime<Utc>) -> Option<Record> {
    let local_id = json_id(field(item, "id"))?;
    let title = collapse_whitespace(field(item, "title").as_str().unwrap_or(""));
    if title.is_empty() {
        return None;
    }
    // A present but unparseable timestamp is a malformed item, not "today"
    let published = match field(item, "publishedAt") {
        Value::Null => now,
        Value::String(s) if s.trim().is_empty() => now,
        Value::String(s) => parse_timestamp(s)?,
        _ => return None,
    };

    let mut rec = Record::new(SourceTag::HuggingFace.qualify(&local_id), title, SourceTag::HuggingFace, published);
    rec.authors = field(item, "authors")
        .as_array()
        .map(|authors| {
            authors
                .iter()
                .filter_map(|a| a.as_str().or_else(|| a["name"].as_str()))
                .map(collapse_whitespace)
                .filter(|n| !n.is_empty())
                .collect()
        })
        .unwrap_or_default();
    rec.abstract_text = collapse_whitespace(field(item, "summary").as_str().unwrap_or(""));
    rec.url = field(item, "url")
        .as_str()
        .filter(|u| !u.is_empty())
        .map(String::from)
        .unwrap_or_else(|| format!("https://huggingface.co/papers/{local_id}"));
    rec.engagement = field(item, "upvotes").as_u64().unwrap_or(0);
    Some(rec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    const BODY: &str = r#"[
      {
        "paper": {
          "id": "2603.00042",
          "title": "Nested Paper Shape",
          "summary": "A summary\nacross lines.",
          "authors": [{"name": "Ada Lovelace"}, {"name": "Alan Turing", "hidden": false}],
          "publishedAt": "2026-03-01T08:00:00.000Z",
          "upvotes": 57
        },
        "publishedAt": "2026-03-02T06:00:00.000Z",
        "title": "Nested Paper Shape"
      },
      {
        "id": "2603.00077",
        "title": "Flat shape without a date",
        "authors": ["Grace Hopper"],
        "upvotes": 3,
        "url": "https://huggingface.co/papers/2603.00077"
      },
      { "id": "2603.00099", "title": "Garbled date", "publishedAt": "yesterday-ish" },
      { "title": "No id at all" }
    ]"#;

    #[test]
    fn test_parse_daily_papers_both_shapes() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let recs = parse_daily_papers(BODY, now).unwrap();
        assert_eq!(recs.len(), 2);

        let nested = &recs[0];
        assert_eq!(nested.id, "hf_2603.00042");
        // Item-level timestamp wins over the nested one
        assert_eq!(nested.published_at, Utc.with_ymd_and_hms(2026, 3, 2, 6, 0, 0).unwrap());
        assert_eq!(nested.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(nested.abstract_text, "A summary across lines.");
        assert_eq!(nested.engagement, 57);
        assert_eq!(nested.url, "https://huggingface.co/papers/2603.00042");
        assert_eq!(nested.pdf_url, None);

        let flat = &recs[1];
        assert_eq!(flat.id, "hf_2603.00077");
        assert_eq!(flat.published_at, now);
        assert_eq!(flat.authors, vec!["Grace Hopper"]);
        assert_eq!(flat.engagement, 3);
    }

    #[test]
    fn test_non_array_payload_is_a_parse_error() {
        let err = parse_daily_papers(r#"{"error": "rate limited"}"#, Utc::now()).unwrap_err();
        assert!(matches!(err, FetchError::Parse(SourceTag::HuggingFace, _)));
    }
}
