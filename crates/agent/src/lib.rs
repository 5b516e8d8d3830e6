//! Optional AI copy enrichment.
//!
//! The deterministic engine in `clusterpilot-core` always produces the
//! recommendation. This crate can ask a model to paraphrase its message and
//! keeps the paraphrase only when it passes the copy guard in `enrichment`.
//!
//! - `llm`: the `LlmClient` seam and transport errors
//! - `gemini`: the Gemini `generateContent` client
//! - `prompt`: the tera prompt template
//! - `enrichment`: `MessageEnricher` and its guard

use std::sync::Arc;

use thiserror::Error;

use clusterpilot_core::config::LlmConfig;

pub mod enrichment;
pub mod gemini;
pub mod llm;
pub mod prompt;

pub use enrichment::{EnrichmentOutcome, EnrichmentStatus, MessageEnricher};
pub use gemini::GeminiClient;
pub use llm::{LlmClient, LlmError};
pub use prompt::{EnrichmentBrief, PromptError, PromptRenderer};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
}

/// Builds the enricher for the configured provider, or `None` when the
/// provider is disabled.
pub fn enricher_from_config(config: &LlmConfig) -> Result<Option<MessageEnricher>, AgentError> {
    if !config.enabled() {
        return Ok(None);
    }
    let client = GeminiClient::from_config(config)?;
    Ok(Some(MessageEnricher::new(Arc::new(client))?))
}
