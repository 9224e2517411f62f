//! paperwatch-llm — Text-generation backends and the record summarizer built on them.
//!
//! The rest of the workspace only depends on the [`Summarizer`] trait; the
//! LLM-backed implementation is one choice among stubs and future backends.

pub mod backend;
pub mod prompt;
pub mod summarizer;

pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message, OpenAiCompatibleBackend};
pub use summarizer::{LlmSummarizer, Summarizer};
