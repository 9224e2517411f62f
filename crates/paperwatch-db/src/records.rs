//! Record repository.
//!
//! Keyed storage of records plus free-text search. Every path that writes
//! a record's searchable text rewrites its FTS row in the same transaction.

use crate::codec::{authors_text, encode_count, encode_ts, row_to_record, RECORD_COLUMNS};
use crate::database::Database;
use crate::error::Result;
use crate::schema::MIN_FTS_TERM_CHARS;
use chrono::Utc;
use paperwatch_common::{FetchFilter, Record, TimeWindow};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Transaction};
use std::sync::Arc;
use tracing::debug;

/// Counts from a batch save.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SaveOutcome {
    pub inserted: usize,
    pub updated: usize,
}

/// Repository for record operations.
#[derive(Clone)]
pub struct RecordRepository {
    db: Arc<Database>,
}

impl RecordRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Upsert a record. Returns `true` if the id was new, `false` if an
    /// existing row was replaced wholesale.
    pub fn save(&self, record: &Record) -> Result<bool> {
        let mut conn = self.db.conn()?;
        let tx = conn.transaction()?;
        let inserted = upsert(&tx, record)?;
        tx.commit()?;
        Ok(inserted)
    }

    /// Upsert many records in one transaction; all or nothing.
    pub fn save_batch(&self, records: &[Record]) -> Result<SaveOutcome> {
        let mut conn = self.db.conn()?;
        let tx = conn.transaction()?;
        let mut outcome = SaveOutcome::default();
        for record in records {
            if upsert(&tx, record)? {
                outcome.inserted += 1;
            } else {
                outcome.updated += 1;
            }
        }
        tx.commit()?;
        debug!(inserted = outcome.inserted, updated = outcome.updated, "Saved record batch");
        Ok(outcome)
    }

    /// Point lookup. Absent ids are `Ok(None)`.
    pub fn get(&self, id: &str) -> Result<Option<Record>> {
        let conn = self.db.conn()?;
        let sql = format!("SELECT {} FROM records r WHERE r.id = ?1", RECORD_COLUMNS);
        let record = conn.query_row(&sql, [id], row_to_record).optional()?;
        Ok(record)
    }

    /// Remove a record and its index entry. Returns whether anything was deleted.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut conn = self.db.conn()?;
        let tx = conn.transaction()?;
        let rowid: Option<i64> = tx
            .query_row("SELECT rowid FROM records WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        let Some(rowid) = rowid else {
            return Ok(false);
        };
        tx.execute("DELETE FROM records_fts WHERE rowid = ?1", [rowid])?;
        tx.execute("DELETE FROM records WHERE rowid = ?1", [rowid])?;
        tx.commit()?;
        Ok(true)
    }

    /// Ranked free-text search over title, authors, abstract and key findings.
    ///
    /// An empty `query` degrades to a filtered scan. Ties (and the scan)
    /// order by publication date descending, then id.
    pub fn search(
        &self,
        query: &str,
        filter: Option<&FetchFilter>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Record>> {
        let mut args: Vec<Value> = Vec::new();
        let (mut sql, order) = match TextQuery::parse(query) {
            TextQuery::All => (
                format!("SELECT {} FROM records r WHERE 1=1", RECORD_COLUMNS),
                "ORDER BY r.published_at DESC, r.id ASC",
            ),
            TextQuery::Match(expr) => {
                args.push(Value::Text(expr));
                (
                    format!(
                        "SELECT {} FROM records r \
                         JOIN records_fts ON records_fts.rowid = r.rowid \
                         WHERE records_fts MATCH ?",
                        RECORD_COLUMNS
                    ),
                    "ORDER BY bm25(records_fts), r.published_at DESC, r.id ASC",
                )
            }
            TextQuery::Substring(text) => {
                let pattern = format!("%{}%", escape_like(&text));
                for _ in 0..4 {
                    args.push(Value::Text(pattern.clone()));
                }
                (
                    format!(
                        "SELECT {} FROM records r WHERE (r.title LIKE ? ESCAPE '\\' \
                         OR r.authors LIKE ? ESCAPE '\\' OR r.abstract LIKE ? ESCAPE '\\' \
                         OR IFNULL(r.key_findings, '') LIKE ? ESCAPE '\\')",
                        RECORD_COLUMNS
                    ),
                    "ORDER BY r.published_at DESC, r.id ASC",
                )
            }
        };

        if let Some(f) = filter {
            if f.days_back > 0 {
                sql.push_str(" AND r.published_at >= ?");
                args.push(Value::Text(encode_ts(f.window_at(Utc::now()).start)));
            }
            if f.min_engagement > 0 {
                sql.push_str(" AND r.engagement >= ?");
                args.push(Value::Integer(encode_count(f.min_engagement)));
            }
            if !f.sources.is_empty() {
                let placeholders = vec!["?"; f.sources.len()].join(",");
                sql.push_str(&format!(" AND r.source IN ({})", placeholders));
                args.extend(f.sources.iter().map(|s| Value::Text(s.as_str().to_string())));
            }
        }

        sql.push(' ');
        sql.push_str(order);
        sql.push_str(" LIMIT ? OFFSET ?");
        args.push(Value::Integer(limit as i64));
        args.push(Value::Integer(offset as i64));

        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), row_to_record)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Records published within the trailing `days`, newest first.
    pub fn recent(&self, days: u32, limit: usize) -> Result<Vec<Record>> {
        self.recent_in(TimeWindow::trailing_days(days, Utc::now()), limit)
    }

    /// Records published within `window`, newest first.
    pub fn recent_in(&self, window: TimeWindow, limit: usize) -> Result<Vec<Record>> {
        self.windowed(window, "r.published_at DESC, r.id ASC", limit)
    }

    /// Records published within the trailing `days`, by engagement then recency.
    pub fn top(&self, days: u32, limit: usize) -> Result<Vec<Record>> {
        self.top_in(TimeWindow::trailing_days(days, Utc::now()), limit)
    }

    /// Records published within `window`, by engagement then recency.
    pub fn top_in(&self, window: TimeWindow, limit: usize) -> Result<Vec<Record>> {
        self.windowed(window, "r.engagement DESC, r.published_at DESC, r.id ASC", limit)
    }

    /// Count total records.
    pub fn count(&self) -> Result<u64> {
        let conn = self.db.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    fn windowed(&self, window: TimeWindow, order: &str, limit: usize) -> Result<Vec<Record>> {
        let sql = format!(
            "SELECT {} FROM records r \
             WHERE r.published_at >= ?1 AND r.published_at < ?2 \
             ORDER BY {} LIMIT ?3",
            RECORD_COLUMNS, order
        );
        let conn = self.db.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![encode_ts(window.start), encode_ts(window.end), limit as i64],
            row_to_record,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

/// Insert or replace one record and rewrite its index row.
fn upsert(tx: &Transaction<'_>, record: &Record) -> Result<bool> {
    let existing: Option<i64> = tx
        .query_row("SELECT rowid FROM records WHERE id = ?1", [&record.id], |row| row.get(0))
        .optional()?;

    let authors = serde_json::to_string(&record.authors)?;
    let categories = serde_json::to_string(&record.categories)?;

    tx.execute(
        "INSERT INTO records (
            id, title, authors, abstract, published_at, source, url, pdf_url,
            engagement, categories, key_findings, methodology, practical_applications,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        ON CONFLICT(id) DO UPDATE SET
            title                  = excluded.title,
            authors                = excluded.authors,
            abstract               = excluded.abstract,
            published_at           = excluded.published_at,
            source                 = excluded.source,
            url                    = excluded.url,
            pdf_url                = excluded.pdf_url,
            engagement             = excluded.engagement,
            categories             = excluded.categories,
            key_findings           = excluded.key_findings,
            methodology            = excluded.methodology,
            practical_applications = excluded.practical_applications,
            updated_at             = excluded.updated_at",
        params![
            record.id,
            record.title,
            authors,
            record.abstract_text,
            encode_ts(record.published_at),
            record.source.as_str(),
            record.url,
            record.pdf_url,
            encode_count(record.engagement),
            categories,
            record.key_findings,
            record.methodology,
            record.practical_applications,
            encode_ts(Utc::now()),
        ],
    )?;

    let rowid = match existing {
        Some(rowid) => {
            tx.execute("DELETE FROM records_fts WHERE rowid = ?1", [rowid])?;
            rowid
        }
        None => tx.last_insert_rowid(),
    };

    tx.execute(
        "INSERT INTO records_fts (rowid, title, authors, abstract, key_findings)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            rowid,
            record.title,
            authors_text(&record.authors),
            record.abstract_text,
            record.key_findings.as_deref().unwrap_or(""),
        ],
    )?;

    Ok(existing.is_none())
}

/// How a user query is run against the store.
#[derive(Debug, PartialEq, Eq)]
enum TextQuery {
    /// Empty query: plain filtered scan.
    All,
    /// FTS5 expression: every usable term must occur as a substring.
    Match(String),
    /// Only terms too short for the trigram index; fall back to LIKE.
    Substring(String),
}

impl TextQuery {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return TextQuery::All;
        }
        let terms: Vec<String> = raw
            .split_whitespace()
            .filter(|t| t.chars().count() >= MIN_FTS_TERM_CHARS)
            // FTS5 string literal: embedded quotes are doubled, not dropped
            .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
            .collect();
        if terms.is_empty() {
            TextQuery::Substring(raw.to_string())
        } else {
            TextQuery::Match(terms.join(" "))
        }
    }
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
