//! Conversions between domain types and SQLite rows.

use chrono::{DateTime, SecondsFormat, Utc};
use paperwatch_common::{Record, Summary};
use rusqlite::types::Type;
use rusqlite::Row;

/// Column list shared by every record SELECT, in `row_to_record` order.
pub const RECORD_COLUMNS: &str = "r.id, r.title, r.authors, r.abstract, r.published_at, r.source, \
     r.url, r.pdf_url, r.engagement, r.categories, r.key_findings, r.methodology, \
     r.practical_applications";

pub const SUMMARY_COLUMNS: &str = "record_id, synopsis, main_contribution, methodology, results, \
     relevance, application_area, technical_difficulty, production_readiness";

/// Fixed-width RFC 3339 in UTC, so lexical order equals chronological order.
pub fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_ts(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}

/// SQLite integers are signed; counts beyond `i64::MAX` saturate.
pub fn encode_count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Authors as indexed by FTS: plain comma-separated names.
pub fn authors_text(authors: &[String]) -> String {
    authors.join(", ")
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn row_to_record(row: &Row<'_>) -> rusqlite::Result<Record> {
    let authors: String = row.get(2)?;
    let published_at: String = row.get(4)?;
    let source: String = row.get(5)?;
    let engagement: i64 = row.get(8)?;
    let categories: String = row.get(9)?;

    Ok(Record {
        id: row.get(0)?,
        title: row.get(1)?,
        authors: serde_json::from_str(&authors).map_err(|e| conversion_error(2, e))?,
        abstract_text: row.get(3)?,
        published_at: decode_ts(&published_at).map_err(|e| conversion_error(4, e))?,
        source: source.parse().map_err(|e| conversion_error(5, e))?,
        url: row.get(6)?,
        pdf_url: row.get(7)?,
        engagement: engagement.max(0) as u64,
        categories: serde_json::from_str(&categories).map_err(|e| conversion_error(9, e))?,
        key_findings: row.get(10)?,
        methodology: row.get(11)?,
        practical_applications: row.get(12)?,
    })
}

pub fn row_to_summary(row: &Row<'_>) -> rusqlite::Result<Summary> {
    let area: String = row.get(6)?;
    let difficulty: String = row.get(7)?;
    let readiness: String = row.get(8)?;

    Ok(Summary {
        record_id: row.get(0)?,
        synopsis: row.get(1)?,
        main_contribution: row.get(2)?,
        methodology: row.get(3)?,
        results: row.get(4)?,
        relevance: row.get(5)?,
        application_area: area.parse().map_err(|e| conversion_error(6, e))?,
        technical_difficulty: difficulty.parse().map_err(|e| conversion_error(7, e))?,
        production_readiness: readiness.parse().map_err(|e| conversion_error(8, e))?,
    })
}
