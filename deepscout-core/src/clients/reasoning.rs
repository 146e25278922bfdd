//! Reasoning-model client over an OpenAI-compatible chat-completions
//! endpoint.
//!
//! Transient failures (timeouts, rate limits, 5xx) are retried with capped
//! exponential backoff; the final outcome is always a structural response.

use super::{ReasoningProvider, ReasoningRequest, ReasoningResponse};
use crate::config::ReasoningConfig;
use crate::error::ClientError;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// Client for planner and synthesizer calls.
pub struct ReasoningClient {
    http: reqwest::Client,
    config: ReasoningConfig,
}

impl std::fmt::Debug for ReasoningClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct CompletionWire {
    #[serde(default)]
    choices: Vec<ChoiceWire>,
}

#[derive(Deserialize)]
struct ChoiceWire {
    message: MessageWire,
}

#[derive(Deserialize)]
struct MessageWire {
    #[serde(default)]
    content: Option<String>,
}

impl ReasoningClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: ReasoningConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("deepscout/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ReasoningConfig {
        &self.config
    }

    async fn reason_once(&self, request: &ReasoningRequest) -> Result<String, ClientError> {
        if request.prompt.trim().is_empty() {
            return Err(ClientError::InvalidRequest(
                "prompt cannot be empty".to_string(),
            ));
        }

        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": request.prompt}));

        let mut body = json!({
            "model": self.config.model,
            "messages": messages,
            "max_completion_tokens": request.max_output_tokens,
        });
        if !self.config.bypass_json_validation {
            if let Some(response_format) = &request.response_format {
                body["response_format"] = response_format.clone();
            }
        }

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Timeout(self.config.timeout.as_millis() as u64)
                } else {
                    ClientError::Http(e)
                }
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::RateLimit(message));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let wire: CompletionWire = response
            .json()
            .await
            .map_err(|e| ClientError::ResponseProcessing(e.to_string()))?;

        let text = wire
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ClientError::NoContent);
        }

        Ok(text)
    }
}

#[async_trait]
impl ReasoningProvider for ReasoningClient {
    async fn reason(&self, request: ReasoningRequest) -> ReasoningResponse {
        let mut last_error: Option<ClientError> = None;

        for attempt in 0..=self.config.max_retries {
            match self.reason_once(&request).await {
                Ok(text) => return ReasoningResponse::ok(text),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    log::warn!(
                        "reasoning request failed (attempt {}/{}): {}, retrying...",
                        attempt + 1,
                        self.config.max_retries + 1,
                        e
                    );
                    let delay = self.config.retry_delay(attempt);
                    last_error = Some(e);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return ReasoningResponse::failure(e.to_string()),
            }
        }

        ReasoningResponse::failure(
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "retry loop exited unexpectedly".to_string()),
        )
    }
}
