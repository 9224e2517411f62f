//! Digest assembly: window resolution, top-N selection, summary lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use paperwatch_common::{Digest, TimeWindow};
use paperwatch_db::{Database, DbError, RecordRepository, SummaryRepository};
use tracing::{debug, info};

/// Length of the window when only one bound (or neither) is given.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Cap on the records read back just to count the window.
const REVIEW_LIMIT: usize = 1000;

pub struct DigestBuilder {
    records: RecordRepository,
    summaries: SummaryRepository,
}

impl DigestBuilder {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            records: RecordRepository::new(db.clone()),
            summaries: SummaryRepository::new(db),
        }
    }

    /// Build a digest of the `top_n` best records published in `[start, end)`.
    ///
    /// Missing bounds are filled in from [`DEFAULT_WINDOW_DAYS`]: neither
    /// given means the week ending now, a lone start runs a week forward and
    /// a lone end a week back.
    pub fn build(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        top_n: usize,
    ) -> Result<Digest, DbError> {
        self.build_window(resolve_window(start, end, Utc::now()), top_n)
    }

    pub fn build_window(&self, window: TimeWindow, top_n: usize) -> Result<Digest, DbError> {
        let records = self.records.top_in(window, top_n)?;
        let total_reviewed = self.records.recent_in(window, REVIEW_LIMIT)?.len();

        let mut summaries = BTreeMap::new();
        for rec in &records {
            if let Some(summary) = self.summaries.latest(&rec.id)? {
                summaries.insert(rec.id.clone(), summary);
            }
        }

        debug!(start = %window.start, end = %window.end, "Digest window");
        info!(
            selected = records.len(),
            summarized = summaries.len(),
            total_reviewed,
            "Digest built"
        );
        Ok(Digest { window, records, summaries, total_reviewed })
    }
}

/// Fill in missing window bounds relative to `now`.
pub fn resolve_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> TimeWindow {
    let week = Duration::days(DEFAULT_WINDOW_DAYS);
    match (start, end) {
        (Some(start), Some(end)) => TimeWindow::new(start, end),
        (Some(start), None) => TimeWindow::new(start, start + week),
        (None, Some(end)) => TimeWindow::new(end - week, end),
        (None, None) => TimeWindow::new(now - week, now),
    }
}
