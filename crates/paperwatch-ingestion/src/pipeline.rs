//! End-to-end ingestion run.
//!
//! Orchestrates one cycle:
//!   1. Fetch from every selected source through the coordinator
//!   2. Merge and deduplicate by record id
//!   3. Upsert the batch into the store (one transaction)
//!   4. Optionally summarize records that have no summary yet
//!
//! Source and summarizer failures are logged and counted; store failures abort the run.

use std::time::Instant;

use paperwatch_common::{FetchFilter, SourceTag};
use paperwatch_db::{DbError, RecordRepository, SummaryRepository};
use paperwatch_llm::Summarizer;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::coordinator::FetchCoordinator;

/// Parameters for a single ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionJob {
    pub filter: FetchFilter,
    /// Upper bound on summaries generated per run.
    pub max_summaries: usize,
}

impl Default for IngestionJob {
    fn default() -> Self {
        Self { filter: FetchFilter::default(), max_summaries: 10 }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestionReport {
    /// Records left after merge, dedup and the engagement threshold.
    pub fetched: usize,
    pub duplicates: usize,
    pub inserted: usize,
    pub updated: usize,
    pub summarized: usize,
    pub summary_failures: usize,
    pub source_errors: Vec<(SourceTag, String)>,
    pub duration_ms: u64,
}

#[instrument(skip_all, fields(days_back = job.filter.days_back))]
pub async fn run_ingestion(
    job: &IngestionJob,
    coordinator: &FetchCoordinator,
    records: &RecordRepository,
    summaries: &SummaryRepository,
    summarizer: Option<&dyn Summarizer>,
) -> Result<IngestionReport, DbError> {
    let t0 = Instant::now();
    info!(sources = ?job.filter.sources, "Starting ingestion run");

    // ── 1. Fetch ──────────────────────────────────────────────────────────────
    let fetch = coordinator.fetch_all(&job.filter, &job.filter.sources).await;
    let mut report = IngestionReport {
        fetched: fetch.records.len(),
        duplicates: fetch.duplicates,
        source_errors: fetch
            .failed_sources()
            .map(|(tag, err)| (tag, err.to_string()))
            .collect(),
        ..IngestionReport::default()
    };

    // ── 2. Persist ────────────────────────────────────────────────────────────
    // One transaction over the whole batch; keep it off the async workers
    let repo = records.clone();
    let batch = fetch.records;
    let (saved, batch) = tokio::task::spawn_blocking(move || repo.save_batch(&batch).map(|saved| (saved, batch)))
        .await
        .map_err(|e| DbError::Task(e.to_string()))??;
    report.inserted = saved.inserted;
    report.updated = saved.updated;

    // ── 3. Summarize ──────────────────────────────────────────────────────────
    if let Some(summarizer) = summarizer {
        for rec in &batch {
            if report.summarized + report.summary_failures >= job.max_summaries {
                break;
            }
            if summaries.latest(&rec.id)?.is_some() {
                continue;
            }
            match summarizer.summarize(rec).await {
                Ok(summary) => {
                    summaries.save(&summary)?;
                    report.summarized += 1;
                    debug!(record_id = %rec.id, "Summary stored");
                }
                Err(e) => {
                    warn!(record_id = %rec.id, error = %e, "Summarization failed; record left without summary");
                    report.summary_failures += 1;
                }
            }
        }
    }

    report.duration_ms = t0.elapsed().as_millis() as u64;
    info!(
        fetched     = report.fetched,
        inserted    = report.inserted,
        updated     = report.updated,
        summarized  = report.summarized,
        errors      = report.source_errors.len(),
        duration_ms = report.duration_ms,
        "Ingestion run complete"
    );
    Ok(report)
}
