//! Paperwatch Database Layer
//!
//! Durable storage for records and their summaries on embedded SQLite,
//! with an FTS5 index over the searchable record fields.
//!
//! Every write that touches a record's searchable text updates the index
//! inside the same transaction, so a reader never sees one without the other.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use paperwatch_db::{Database, RecordRepository};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Arc::new(Database::open("./data/paperwatch.db")?);
//!     let records = RecordRepository::new(db.clone());
//!     for rec in records.recent(7, 20)? {
//!         println!("{} {}", rec.published_at, rec.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod schema;
pub mod codec;
pub mod records;
pub mod summaries;

pub use database::{Database, StoreStats};
pub use error::{DbError, Result};
pub use records::{RecordRepository, SaveOutcome};
pub use summaries::SummaryRepository;
pub use schema::{TABLE_RECORDS, TABLE_RECORDS_FTS, TABLE_SUMMARIES};
