//! paperwatch-common — Shared types, errors, and the outbound HTTP client used across all Paperwatch crates.

pub mod error;
pub mod entities;
pub mod filter;
pub mod digest;
pub mod sandbox;

// Re-export commonly used types
pub use digest::Digest;
pub use entities::{
    ApplicationArea, ProductionReadiness, Record, SourceTag, Summary, TechnicalDifficulty,
};
pub use filter::{FetchFilter, TimeWindow, Topic};
