//! Table layout.
//!
//! Two primary tables plus one FTS5 index. The index is a standalone FTS5
//! table keyed by the `records` rowid; it is written explicitly by the
//! repository inside each record transaction rather than by triggers.

pub const TABLE_RECORDS: &str = "records";
pub const TABLE_SUMMARIES: &str = "summaries";
pub const TABLE_RECORDS_FTS: &str = "records_fts";

// =============================================================================
// Records
// =============================================================================

/// `authors` and `categories` hold JSON arrays; `published_at` holds an
/// RFC 3339 UTC timestamp with fixed nanosecond precision so that string
/// comparison orders the same way as time.
pub const CREATE_RECORDS: &str = "
    CREATE TABLE IF NOT EXISTS records (
        id                     TEXT PRIMARY KEY,
        title                  TEXT NOT NULL,
        authors                TEXT NOT NULL,
        abstract               TEXT NOT NULL,
        published_at           TEXT NOT NULL,
        source                 TEXT NOT NULL,
        url                    TEXT NOT NULL,
        pdf_url                TEXT,
        engagement             INTEGER NOT NULL DEFAULT 0,
        categories             TEXT NOT NULL,
        key_findings           TEXT,
        methodology            TEXT,
        practical_applications TEXT,
        updated_at             TEXT NOT NULL
    )";

// =============================================================================
// Summaries (append-only)
// =============================================================================

pub const CREATE_SUMMARIES: &str = "
    CREATE TABLE IF NOT EXISTS summaries (
        id                   INTEGER PRIMARY KEY AUTOINCREMENT,
        record_id            TEXT NOT NULL REFERENCES records(id) ON DELETE CASCADE,
        synopsis             TEXT NOT NULL,
        main_contribution    TEXT NOT NULL,
        methodology          TEXT NOT NULL,
        results              TEXT NOT NULL,
        relevance            TEXT NOT NULL,
        application_area     TEXT NOT NULL,
        technical_difficulty TEXT NOT NULL,
        production_readiness TEXT NOT NULL,
        created_at           TEXT NOT NULL
    )";

// =============================================================================
// Full-text index
// =============================================================================

/// Trigram tokenizer: any substring of three or more characters is matchable,
/// case-insensitively.
pub const CREATE_RECORDS_FTS: &str = "
    CREATE VIRTUAL TABLE IF NOT EXISTS records_fts USING fts5(
        title,
        authors,
        abstract,
        key_findings,
        tokenize = 'trigram'
    )";

pub const CREATE_INDEXES: [&str; 4] = [
    "CREATE INDEX IF NOT EXISTS idx_records_published_at ON records(published_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_records_source ON records(source)",
    "CREATE INDEX IF NOT EXISTS idx_records_engagement ON records(engagement DESC, published_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_summaries_record ON summaries(record_id, id DESC)",
];

/// Shortest term the trigram index can match.
pub const MIN_FTS_TERM_CHARS: usize = 3;
