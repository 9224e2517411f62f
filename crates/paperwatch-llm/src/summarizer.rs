//! Record summarization contract and its LLM-backed implementation.

use std::sync::Arc;

use async_trait::async_trait;
use paperwatch_common::{Record, Summary};
use tracing::{debug, instrument};

use crate::backend::{LlmBackend, LlmError, LlmRequest, Message};
use crate::prompt::{build_prompt, parse_summary_response, SYSTEM_PROMPT};

/// Produces one structured summary per record. Implementations may fail;
/// callers treat a failure as "this record stays unsummarized".
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, record: &Record) -> Result<Summary, LlmError>;
}

/// Summarizer that prompts a chat-completion backend and parses the
/// sectioned reply.
pub struct LlmSummarizer {
    backend: Arc<dyn LlmBackend>,
    temperature: f32,
    max_tokens: u32,
}

impl LlmSummarizer {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend, temperature: 0.7, max_tokens: 1500 }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    #[instrument(skip(self, record), fields(record_id = %record.id, model = self.backend.model_id()))]
    async fn summarize(&self, record: &Record) -> Result<Summary, LlmError> {
        let max_tokens = self.max_tokens.min(self.backend.max_output_tokens() as u32);
        let req = LlmRequest {
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(build_prompt(record))],
            model: None,
            max_tokens: Some(max_tokens),
            temperature: Some(self.temperature),
        };
        let resp = self.backend.complete(req).await?;
        debug!(
            prompt_tokens = resp.prompt_tokens,
            completion_tokens = resp.completion_tokens,
            "Summary generated"
        );
        Ok(parse_summary_response(&record.id, resp.content.trim()))
    }
}
