//! arXiv export API client.
//!
//! Endpoint: http://export.arxiv.org/api/query (Atom 1.0 feed)
//!
//! Results are requested newest-first and paged with `start` / `max_results`.
//! Paging stops at a short page, once a page reaches back past the window
//! start, or at the configured result cap.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paperwatch_common::sandbox::SandboxClient;
use paperwatch_common::{FetchFilter, Record, SourceTag};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, info, instrument, warn};

use super::{collapse_whitespace, get_text, RecordSource, RetryPolicy};
use crate::error::FetchError;
use crate::rate_limit::RateLimiter;

pub const ARXIV_QUERY_URL: &str = "http://export.arxiv.org/api/query";

pub struct ArxivClient {
    client: SandboxClient,
    limiter: RateLimiter,
    retry: RetryPolicy,
    base_url: String,
    page_size: usize,
    max_results: usize,
}

impl ArxivClient {
    pub fn new(limiter: RateLimiter, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: SandboxClient::with_timeout(timeout)?,
            limiter,
            retry: RetryPolicy::default(),
            base_url: ARXIV_QUERY_URL.to_string(),
            page_size: 100,
            max_results: 200,
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

    /// Page size per request and overall cap on requested results.
    pub fn with_paging(mut self, page_size: usize, max_results: usize) -> Self {
        self.page_size = page_size.max(1);
        self.max_results = max_results;
        self
    }
}

#[async_trait]
impl RecordSource for ArxivClient {
    fn tag(&self) -> SourceTag {
        SourceTag::Arxiv
    }

    #[instrument(skip(self, filter), fields(source = "arxiv"))]
    async fn fetch(&self, filter: &FetchFilter) -> Result<Vec<Record>, FetchError> {
        let window = filter.window();
        let query = build_search_query(filter);
        debug!(%query, "arXiv search query");

        let mut records = Vec::new();
        let mut start = 0usize;

        while start < self.max_results {
            let batch = self.page_size.min(self.max_results - start);
            let params = [
                ("search_query", query.clone()),
                ("start", start.to_string()),
                ("max_results", batch.to_string()),
                ("sortBy", "submittedDate".to_string()),
                ("sortOrder", "descending".to_string()),
            ];

            let page = match get_text(SourceTag::Arxiv, &self.client, &self.limiter, &self.retry, &self.base_url, &params)
                .await
                .and_then(|xml| parse_atom_feed(&xml).map_err(|e| FetchError::parse(SourceTag::Arxiv, e)))
            {
                Ok(page) => page,
                // Earlier pages are still good; lose only this call
                Err(e) if start > 0 => {
                    warn!(start, error = %e, "arXiv page failed, keeping earlier pages");
                    break;
                }
                Err(e) => return Err(e),
            };

            let oldest = page.records.iter().map(|r| r.published_at).min();
            let before = records.len();
            records.extend(page.records.into_iter().filter(|r| window.contains(r.published_at)));
            debug!(start, entries = page.entries, kept = records.len() - before, "arXiv page parsed");

            if page.entries < batch {
                break;
            }
            if oldest.is_some_and(|t| t < window.start) {
                break;
            }
            start += batch;
        }

        info!(count = records.len(), "arXiv fetch complete");
        Ok(records)
    }
}

// ── Query builder ─────────────────────────────────────────────────────────────

/// `(cat:A OR cat:B) AND (all:"kw1" OR all:"kw2")`; the keyword group is
/// omitted when there are no keywords.
pub fn build_search_query(filter: &FetchFilter) -> String {
    let cats: Vec<String> = filter
        .arxiv_categories()
        .into_iter()
        .map(|c| format!("cat:{c}"))
        .collect();
    let mut groups = vec![format!("({})", cats.join(" OR "))];

    let keywords: Vec<String> = filter
        .keywords
        .iter()
        .map(|k| k.trim().replace('"', ""))
        .filter(|k| !k.is_empty())
        .map(|k| format!("all:\"{k}\""))
        .collect();
    if !keywords.is_empty() {
        groups.push(format!("({})", keywords.join(" OR ")));
    }

    groups.join(" AND ")
}

// ── Atom parser ───────────────────────────────────────────────────────────────

/// One parsed response page.
#[derive(Debug, Default)]
pub struct AtomPage {
    /// `<entry>` elements seen, including skipped ones.
    pub entries: usize,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Id,
    Title,
    Summary,
    Published,
    AuthorName,
}

#[derive(Debug, Default)]
struct EntryDraft {
    id: String,
    title: String,
    summary: String,
    published: String,
    authors: Vec<String>,
    categories: BTreeSet<String>,
    abs_url: Option<String>,
    pdf_url: Option<String>,
}

impl EntryDraft {
    fn set(&mut self, field: Field, text: String) {
        match field {
            Field::Id         => self.id = text,
            Field::Title      => self.title = text,
            Field::Summary    => self.summary = text,
            Field::Published  => self.published = text,
            Field::AuthorName => {
                let name = collapse_whitespace(&text);
                if !name.is_empty() {
                    self.authors.push(name);
                }
            }
        }
    }

    fn link(&mut self, e: &BytesStart<'_>) {
        let Some(href) = attr(e, b"href") else { return };
        if attr(e, b"title").as_deref() == Some("pdf") {
            self.pdf_url = Some(href);
        } else if attr(e, b"rel").as_deref() == Some("alternate") {
            self.abs_url = Some(href);
        }
    }

    fn category(&mut self, e: &BytesStart<'_>) {
        if let Some(term) = attr(e, b"term") {
            self.categories.insert(term);
        }
    }

    /// `None` when id, title or published date is missing or unusable.
    fn into_record(self) -> Option<Record> {
        let local_id = arxiv_local_id(&self.id)?;
        let title = collapse_whitespace(&self.title);
        if title.is_empty() {
            return None;
        }
        let published = DateTime::parse_from_rfc3339(self.published.trim())
            .ok()?
            .with_timezone(&Utc);

        let mut rec = Record::new(SourceTag::Arxiv.qualify(&local_id), title, SourceTag::Arxiv, published);
        rec.authors = self.authors;
        rec.abstract_text = collapse_whitespace(&self.summary);
        rec.url = self.abs_url.unwrap_or_else(|| self.id.trim().to_string());
        rec.pdf_url = self.pdf_url;
        rec.categories = self.categories;
        Some(rec)
    }
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Parse an arXiv Atom feed. Entries missing required fields are skipped;
/// a document that is not a feed at all is an error.
pub fn parse_atom_feed(xml: &str) -> Result<AtomPage, String> {
    let mut page = AtomPage::default();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // State machine for XML parsing
    let mut saw_feed = false;
    let mut draft: Option<EntryDraft> = None;
    let mut field: Option<Field> = None;
    let mut in_author = false;
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"feed" => saw_feed = true,
                b"entry" => {
                    page.entries += 1;
                    draft = Some(EntryDraft::default());
                }
                b"author" => in_author = true,
                b"link" => {
                    if let Some(d) = draft.as_mut() { d.link(e) }
                }
                b"category" => {
                    if let Some(d) = draft.as_mut() { d.category(e) }
                }
                tag if draft.is_some() => {
                    field = match tag {
                        b"id"                => Some(Field::Id),
                        b"title"             => Some(Field::Title),
                        b"summary"           => Some(Field::Summary),
                        b"published"         => Some(Field::Published),
                        b"name" if in_author => Some(Field::AuthorName),
                        _ => None,
                    };
                    text.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if let Some(d) = draft.as_mut() {
                    match e.local_name().as_ref() {
                        b"link"     => d.link(e),
                        b"category" => d.category(e),
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if field.is_some() {
                    match e.unescape() {
                        Ok(t) => text.push_str(&t),
                        Err(_) => text.push_str(&String::from_utf8_lossy(e)),
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"entry" => {
                    if let Some(d) = draft.take() {
                        match d.into_record() {
                            Some(rec) => page.records.push(rec),
                            None => debug!("Skipping arXiv entry missing id, title or published date"),
                        }
                    }
                    field = None;
                }
                b"author" => in_author = false,
                _ => {
                    if let (Some(f), Some(d)) = (field.take(), draft.as_mut()) {
                        d.set(f, std::mem::take(&mut text));
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!("XML error at byte {}: {}", reader.buffer_position(), e));
            }
            _ => {}
        }
        buf.clear();
    }

    if !saw_feed {
        return Err("response is not an Atom feed".to_string());
    }
    Ok(page)
}

/// `http://arxiv.org/abs/2401.00001v2` → `2401.00001`;
/// `http://arxiv.org/abs/hep-th/9901001v1` → `hep-th/9901001`.
///
/// The version suffix is dropped so revisions of one paper share a record.
pub fn arxiv_local_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let tail = match raw.find("/abs/") {
        Some(i) => &raw[i + "/abs/".len()..],
        None => raw.rsplit('/').next().unwrap_or(raw),
    };
    let base = strip_version(tail);
    (!base.is_empty()).then(|| base.to_string())
}

fn strip_version(id: &str) -> &str {
    if let Some(pos) = id.rfind('v') {
        let digits = &id[pos + 1..];
        if pos > 0 && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return &id[..pos];
        }
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperwatch_common::Topic;
    use pretty_assertions::assert_eq;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <id>http://arxiv.org/api/abc</id>
  <title type="html">ArXiv Query: search_query=cat:cs.CL</title>
  <updated>2026-03-02T00:00:00-05:00</updated>
  <entry>
    <id>http://arxiv.org/abs/2603.01234v2</id>
    <updated>2026-03-01T12:00:00Z</updated>
    <published>2026-02-27T18:30:00Z</published>
    <title>Sparse Routing
      for Mixture-of-Experts &amp; Friends</title>
    <summary>  We study routing.
  It is fast.
    </summary>
    <author><name>Ada Lovelace</name><arxiv:affiliation>Analytical Engines</arxiv:affiliation></author>
    <author><name>Alan Turing</name></author>
    <link href="http://arxiv.org/abs/2603.01234v2" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2603.01234v2" rel="related" type="application/pdf"/>
    <arxiv:primary_category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2603.09999v1</id>
    <title>No publication date</title>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2603.08888v1</id>
    <published>2026-02-26T00:00:00Z</published>
    <title>   </title>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed_normalises_entry() {
        let page = parse_atom_feed(FEED).unwrap();
        assert_eq!(page.entries, 3);
        assert_eq!(page.records.len(), 1);

        let rec = &page.records[0];
        assert_eq!(rec.id, "arxiv_2603.01234");
        assert_eq!(rec.title, "Sparse Routing for Mixture-of-Experts & Friends");
        assert_eq!(rec.abstract_text, "We study routing. It is fast.");
        assert_eq!(rec.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(rec.url, "http://arxiv.org/abs/2603.01234v2");
        assert_eq!(rec.pdf_url.as_deref(), Some("http://arxiv.org/pdf/2603.01234v2"));
        assert_eq!(rec.categories.iter().map(String::as_str).collect::<Vec<_>>(), vec!["cs.CL", "cs.LG"]);
        assert_eq!(rec.published_at.to_rfc3339(), "2026-02-27T18:30:00+00:00");
        assert_eq!(rec.source, SourceTag::Arxiv);
        assert_eq!(rec.engagement, 0);
    }

    #[test]
    fn test_feed_level_elements_are_not_entries() {
        let page = parse_atom_feed(r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>t</title></feed>"#).unwrap();
        assert_eq!(page.entries, 0);
        assert!(page.records.is_empty());
    }

    #[test]
    fn test_non_feed_payload_is_an_error() {
        assert!(parse_atom_feed("<html><body>Rate exceeded</body></html>").is_err());
        assert!(parse_atom_feed("<feed><entry><id>x</entry></feed>").is_err());
    }

    #[test]
    fn test_local_id_strips_prefix_and_version() {
        assert_eq!(arxiv_local_id("http://arxiv.org/abs/2401.00001v1").as_deref(), Some("2401.00001"));
        assert_eq!(arxiv_local_id("http://arxiv.org/abs/hep-th/9901001v3").as_deref(), Some("hep-th/9901001"));
        assert_eq!(arxiv_local_id("2401.00001").as_deref(), Some("2401.00001"));
        assert_eq!(arxiv_local_id("  ").as_deref(), None);
    }

    #[test]
    fn test_query_defaults_to_broad_categories() {
        let q = build_search_query(&FetchFilter::default());
        assert_eq!(q, "(cat:cs.AI OR cat:cs.CL OR cat:cs.LG)");
    }

    #[test]
    fn test_query_ands_topics_with_keywords() {
        let f = FetchFilter {
            topics: vec![Topic::ComputerVision],
            keywords: vec!["diffusion".into(), " \"video\" ".into(), "".into()],
            ..FetchFilter::default()
        };
        assert_eq!(
            build_search_query(&f),
            "(cat:cs.CV) AND (all:\"diffusion\" OR all:\"video\")"
        );
    }
}
