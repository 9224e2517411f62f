//! paperwatch-ingestion — Fetching publication records from upstream sources.
//! - Per-client rate limiting
//! - Source clients (arXiv, Papers with Code, Hugging Face daily papers)
//! - Fan-out, merge and first-seen-wins deduplication
//! - The fetch → store → summarize run

pub mod coordinator;
pub mod error;
pub mod pipeline;
pub mod rate_limit;
pub mod sources;

pub use coordinator::{FetchCoordinator, FetchReport, SourceOutcome};
pub use error::FetchError;
pub use pipeline::{run_ingestion, IngestionJob, IngestionReport};
pub use rate_limit::RateLimiter;
pub use sources::arxiv::ArxivClient;
pub use sources::hugging_face::HuggingFaceClient;
pub use sources::papers_with_code::PapersWithCodeClient;
pub use sources::{RecordSource, RetryPolicy};
