//! Summary repository. Append-only: rows are never updated in place.

use crate::codec::{encode_ts, row_to_summary, SUMMARY_COLUMNS};
use crate::database::Database;
use crate::error::Result;
use chrono::Utc;
use paperwatch_common::Summary;
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;

#[derive(Clone)]
pub struct SummaryRepository {
    db: Arc<Database>,
}

impl SummaryRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append a summary. The referenced record must already be stored.
    pub fn save(&self, summary: &Summary) -> Result<()> {
        let conn = self.db.conn()?;
        conn.execute(
            "INSERT INTO summaries (
                record_id, synopsis, main_contribution, methodology, results, relevance,
                application_area, technical_difficulty, production_readiness, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                summary.record_id,
                summary.synopsis,
                summary.main_contribution,
                summary.methodology,
                summary.results,
                summary.relevance,
                summary.application_area.as_str(),
                summary.technical_difficulty.as_str(),
                summary.production_readiness.as_str(),
                encode_ts(Utc::now()),
            ],
        )?;
        Ok(())
    }

    /// The most recently stored summary for a record, if any.
    pub fn latest(&self, record_id: &str) -> Result<Option<Summary>> {
        let conn = self.db.conn()?;
        // Autoincrement id orders insertions even when created_at collides
        let sql = format!(
            "SELECT {} FROM summaries WHERE record_id = ?1 ORDER BY id DESC LIMIT 1",
            SUMMARY_COLUMNS
        );
        let summary = conn.query_row(&sql, [record_id], row_to_summary).optional()?;
        Ok(summary)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.db.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM summaries", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}
