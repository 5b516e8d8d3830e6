use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::warn;

use clusterpilot_core::config::{LlmConfig, LlmProvider};

use crate::llm::{LlmClient, LlmError};

const RETRY_BACKOFF_MS: u64 = 250;

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: SecretString,
    temperature: f32,
    max_retries: u32,
}

impl GeminiClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.provider == LlmProvider::Disabled {
            return Err(LlmError::Disabled);
        }
        let api_key = config.api_key.clone().ok_or(LlmError::MissingApiKey)?;
        let client =
            Client::builder().timeout(Duration::from_secs(config.timeout_secs.max(1))).build()?;

        Ok(Self {
            client,
            endpoint: endpoint(&config.base_url, &config.model),
            api_key,
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_once(&self, body: &GenerateContentRequest<'_>) -> Result<String, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|error| LlmError::InvalidPayload(error.to_string()))?;
        payload.into_text()
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = GenerateContentRequest::new(prompt, self.temperature);
        let mut attempt = 0;

        loop {
            match self.send_once(&body).await {
                Ok(text) => return Ok(text),
                Err(error) if error.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        event_name = "agent.llm.retry",
                        attempt,
                        error = %error,
                        "gemini request failed, retrying"
                    );
                    let backoff = RETRY_BACKOFF_MS * u64::from(attempt);
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }
}

fn endpoint(base_url: &str, model: &str) -> String {
    format!("{}/v1beta/models/{}:generateContent", base_url.trim_end_matches('/'), model.trim())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str, temperature: f32) -> Self {
        Self {
            contents: vec![Content { role: "user", parts: vec![RequestPart { text: prompt }] }],
            generation_config: GenerationConfig {
                temperature,
                response_mime_type: "application/json",
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Result<String, LlmError> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            Err(LlmError::EmptyResponse)
        } else {
            Ok(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use clusterpilot_core::config::{AppConfig, LlmProvider};

    use super::{endpoint, GeminiClient, GenerateContentRequest, GenerateContentResponse};
    use crate::llm::LlmError;

    #[test]
    fn endpoint_joins_base_url_and_model() {
        assert_eq!(
            endpoint("https://generativelanguage.googleapis.com/", "gemini-2.5-pro"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[test]
    fn request_body_asks_for_json_output() {
        let body = GenerateContentRequest::new("olá", 0.5);
        let value = serde_json::to_value(&body).expect("serialize");

        assert_eq!(
            value,
            json!({
                "contents": [{ "role": "user", "parts": [{ "text": "olá" }] }],
                "generationConfig": { "temperature": 0.5, "responseMimeType": "application/json" }
            })
        );
    }

    #[test]
    fn response_text_joins_parts_of_the_first_candidate() {
        let payload: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "{\"message\":" }, { "text": "\"oi\"}" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .expect("deserialize");

        assert_eq!(payload.into_text().expect("text"), "{\"message\":\"oi\"}");
    }

    #[test]
    fn empty_candidates_are_an_error() {
        let payload: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [] })).expect("deserialize");
        assert!(matches!(payload.into_text(), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn disabled_provider_builds_no_client() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, LlmProvider::Disabled);
        assert!(matches!(GeminiClient::from_config(&config.llm), Err(LlmError::Disabled)));
    }

    #[test]
    fn enabled_provider_without_key_is_rejected() {
        let mut config = AppConfig::default();
        config.llm.provider = LlmProvider::Gemini;
        assert!(matches!(GeminiClient::from_config(&config.llm), Err(LlmError::MissingApiKey)));
    }
}
