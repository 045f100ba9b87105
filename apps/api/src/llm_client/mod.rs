/// LLM Client: the single point of entry for all Claude API calls in TalentMatch.
///
/// No other module may call the Anthropic API directly. The ranking pipeline
/// depends on the `TextGenerator` trait so tests can swap in a fake.
///
/// Model: claude-sonnet-4-5 (hardcoded; do not make configurable to prevent drift)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all LLM calls in TalentMatch.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Timeouts, connection failures, 429 and 5xx are worth another attempt.
    /// Other 4xx responses and malformed bodies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::Timeout(_) => true,
            LlmError::Parse(_) | LlmError::RetriesExhausted { .. } | LlmError::EmptyContent => {
                false
            }
        }
    }
}

/// Plain-text completion. Implemented by `LlmClient`; faked in tests.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The single LLM client used by all services in TalentMatch.
/// Wraps the Anthropic Messages API with per-call timeout and retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    timeout: Duration,
    max_attempts: u32,
}

impl LlmClient {
    pub fn new(api_key: String, timeout: Duration, max_attempts: u32) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            timeout,
            max_attempts: max_attempts.max(1),
        })
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    /// Retries retryable failures with exponential backoff (1s, 2s, 4s, ...).
    pub async fn call(
        &self,
        prompt: &str,
        system: &str,
        temperature: f32,
    ) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.send_once(&request_body).await {
                Ok(response) => {
                    debug!(
                        "LLM call succeeded: input_tokens={}, output_tokens={}",
                        response.usage.input_tokens, response.usage.output_tokens
                    );
                    return Ok(response);
                }
                Err(e) if e.is_retryable() => {
                    warn!("LLM call failed with retryable error: {e}");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts: self.max_attempts,
            last: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt made".to_string()),
        })
    }

    async fn send_once(&self, request_body: &AnthropicRequest<'_>) -> Result<LlmResponse, LlmError> {
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout)
                } else {
                    LlmError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl TextGenerator for LlmClient {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, system, prompts::DEFAULT_TEMPERATURE).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(text.to_string())
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000 * (1 << (attempt - 1).min(6)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(2));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
    }

    #[test]
    fn test_server_errors_and_rate_limits_are_retryable() {
        let rate_limited = LlmError::Api {
            status: 429,
            message: "slow down".to_string(),
        };
        let overloaded = LlmError::Api {
            status: 529,
            message: "overloaded".to_string(),
        };
        assert!(rate_limited.is_retryable());
        assert!(overloaded.is_retryable());
        assert!(LlmError::Timeout(Duration::from_secs(5)).is_retryable());
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        let bad_request = LlmError::Api {
            status: 400,
            message: "prompt is too long".to_string(),
        };
        assert!(!bad_request.is_retryable());
        assert!(!LlmError::EmptyContent.is_retryable());
    }

    #[test]
    fn test_response_text_picks_first_text_block() {
        let response: LlmResponse = serde_json::from_str(
            r#"{
                "content": [
                    {"type": "tool_use"},
                    {"type": "text", "text": "Jane has 5 years of Python."}
                ],
                "usage": {"input_tokens": 10, "output_tokens": 7}
            }"#,
        )
        .unwrap();
        assert_eq!(response.text(), Some("Jane has 5 years of Python."));
    }
}
