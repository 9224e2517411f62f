//! Fan-out over the registered sources, merge and deduplicate.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use paperwatch_common::{FetchFilter, Record, SourceTag};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::FetchError;
use crate::sources::RecordSource;

/// Per-source outcome of one `fetch_all` call.
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source: SourceTag,
    pub fetched: usize,
    pub error: Option<String>,
}

/// Merged records plus what each source contributed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchReport {
    pub records: Vec<Record>,
    pub outcomes: Vec<SourceOutcome>,
    /// Records dropped because an earlier source already produced their id.
    pub duplicates: usize,
}

impl FetchReport {
    pub fn failed_sources(&self) -> impl Iterator<Item = (SourceTag, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.error.as_deref().map(|e| (o.source, e)))
    }
}

pub struct FetchCoordinator {
    sources: Vec<Arc<dyn RecordSource>>,
    source_timeout: Duration,
    concurrent: bool,
}

impl FetchCoordinator {
    pub fn new(source_timeout: Duration) -> Self {
        Self { sources: Vec::new(), source_timeout, concurrent: false }
    }

    /// Run the sources at the same time instead of one after another.
    /// Each still paces itself through its own limiter.
    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    /// Register a source. Registration order is the default fetch order.
    pub fn register(&mut self, source: Arc<dyn RecordSource>) {
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: Arc<dyn RecordSource>) -> Self {
        self.register(source);
        self
    }

    pub fn registered(&self) -> Vec<SourceTag> {
        self.sources.iter().map(|s| s.tag()).collect()
    }

    /// Fetch from `sources` (every registered source when empty), in that order.
    ///
    /// Failed sources contribute nothing and are reported, never raised.
    /// Duplicate ids keep the record from the earliest source. Records below
    /// `filter.min_engagement` are dropped after the merge.
    pub async fn fetch_all(&self, filter: &FetchFilter, sources: &[SourceTag]) -> FetchReport {
        let selected = self.select(sources);

        let results: Vec<(SourceTag, Result<Vec<Record>, FetchError>)> = if self.concurrent {
            join_all(selected.iter().map(|s| self.fetch_one(s.as_ref(), filter))).await
        } else {
            let mut out = Vec::with_capacity(selected.len());
            for s in &selected {
                out.push(self.fetch_one(s.as_ref(), filter).await);
            }
            out
        };

        let mut report = FetchReport::default();
        let mut seen = HashSet::new();
        for (source, result) in results {
            match result {
                Ok(records) => {
                    info!(%source, count = records.len(), "Records retrieved");
                    report.outcomes.push(SourceOutcome { source, fetched: records.len(), error: None });
                    for rec in records {
                        if seen.insert(rec.id.clone()) {
                            report.records.push(rec);
                        } else {
                            report.duplicates += 1;
                        }
                    }
                }
                Err(e) => {
                    warn!(%source, error = %e, "Source failed; continuing without it");
                    report.outcomes.push(SourceOutcome { source, fetched: 0, error: Some(e.to_string()) });
                }
            }
        }

        if filter.min_engagement > 0 {
            report.records.retain(|r| r.engagement >= filter.min_engagement);
        }
        report
    }

    fn select(&self, requested: &[SourceTag]) -> Vec<Arc<dyn RecordSource>> {
        if requested.is_empty() {
            return self.sources.clone();
        }
        let mut selected = Vec::new();
        for tag in requested {
            match self.sources.iter().find(|s| s.tag() == *tag) {
                Some(s) if !selected.iter().any(|x: &Arc<dyn RecordSource>| x.tag() == *tag) => {
                    selected.push(s.clone());
                }
                Some(_) => {}
                None => {
                    warn!(source = %tag, "No client registered for requested source");
                }
            }
        }
        selected
    }

    async fn fetch_one(
        &self,
        source: &dyn RecordSource,
        filter: &FetchFilter,
    ) -> (SourceTag, Result<Vec<Record>, FetchError>) {
        let tag = source.tag();
        let result = match tokio::time::timeout(self.source_timeout, source.fetch(filter)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(tag, self.source_timeout)),
        };
        (tag, result)
    }
}
