use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

/// Text-in, text-out model client. Nothing it returns is trusted as-is.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm provider is disabled")]
    Disabled,
    #[error("llm api key is not configured")]
    MissingApiKey,
    #[error("llm transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("llm endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("llm response carried no text")]
    EmptyResponse,
    #[error("llm response could not be decoded: {0}")]
    InvalidPayload(String),
}

impl LlmError {
    /// Rate limits, server errors and transport failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(error) => error.is_timeout() || error.is_connect(),
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
