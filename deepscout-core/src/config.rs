//! Configuration for the provider clients.
//!
//! Config values are injected at construction; environment variables are
//! read exactly once via the `from_env` constructors, never at request time.

use crate::error::ResearchError;
use std::env;
use std::time::Duration;

/// Default reasoning model used for the planner and synthesizer when the
/// caller's chat model does not qualify.
pub const DEFAULT_REASONING_MODEL: &str = "o1-mini";

/// Model id prefixes that qualify as reasoning models.
///
/// The planner and synthesizer require reasoning capability; anything else
/// is substituted with the configured default.
const REASONING_MODEL_PREFIXES: &[&str] = &["o1", "o3", "o4", "deepseek-reasoner", "qwq"];

/// Check whether a model id qualifies as a reasoning model.
pub fn is_reasoning_model(model: &str) -> bool {
    REASONING_MODEL_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

/// Configuration for the Firecrawl search/extract client
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct FirecrawlConfig {
    /// API key sent as a bearer token
    pub api_key: String,

    /// Base URL of the service
    ///
    /// Default: `https://api.firecrawl.dev`
    pub base_url: String,

    /// Timeout for individual search/extract requests
    ///
    /// Default: 30 seconds
    pub timeout: Duration,

    /// Maximum results requested per search call
    ///
    /// Default: 10
    pub search_limit: u32,
}

impl FirecrawlConfig {
    /// Create a configuration with the given API key and default settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.firecrawl.dev".to_string(),
            timeout: Duration::from_secs(30),
            search_limit: 10,
        }
    }

    /// Read the configuration from the environment.
    ///
    /// Requires `FIRECRAWL_API_KEY`.
    pub fn from_env() -> Result<Self, ResearchError> {
        let api_key = env::var("FIRECRAWL_API_KEY").map_err(|_| {
            ResearchError::InvalidConfig("FIRECRAWL_API_KEY is not set".to_string())
        })?;
        Ok(Self::new(api_key))
    }

    /// Set the base URL of the service.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum results requested per search call.
    #[must_use]
    pub fn with_search_limit(mut self, limit: u32) -> Self {
        self.search_limit = limit;
        self
    }
}

/// Configuration for the reasoning-model client
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ReasoningConfig {
    /// API key sent as a bearer token
    pub api_key: String,

    /// Base URL of the OpenAI-compatible endpoint
    ///
    /// Default: `https://api.openai.com/v1`
    pub base_url: String,

    /// Model id for planner and synthesizer calls
    ///
    /// Default: [`DEFAULT_REASONING_MODEL`]
    pub model: String,

    /// Timeout for individual reasoning requests
    ///
    /// Reasoning models spend output tokens thinking before answering, so
    /// this is much longer than a chat-model timeout.
    ///
    /// Default: 120 seconds
    pub timeout: Duration,

    /// Maximum number of retries on transient failures
    ///
    /// Default: 1
    pub max_retries: u32,

    /// Base delay for exponential backoff (milliseconds)
    ///
    /// Default: 1000ms
    pub retry_base_delay_ms: u64,

    /// Skip the structured-output constraint on planner calls
    ///
    /// Allows models without structured-output support; responses are then
    /// parsed best-effort and a schema mismatch surfaces as a planner error.
    ///
    /// Default: false
    pub bypass_json_validation: bool,
}

impl ReasoningConfig {
    /// Create a configuration with the given API key and default settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: DEFAULT_REASONING_MODEL.to_string(),
            timeout: Duration::from_secs(120),
            max_retries: 1,
            retry_base_delay_ms: 1000,
            bypass_json_validation: false,
        }
    }

    /// Read the configuration from the environment.
    ///
    /// Requires `OPENAI_API_KEY`; honors `REASONING_MODEL` and
    /// `BYPASS_JSON_VALIDATION`.
    pub fn from_env() -> Result<Self, ResearchError> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| ResearchError::InvalidConfig("OPENAI_API_KEY is not set".to_string()))?;

        let mut config = Self::new(api_key);
        if let Ok(model) = env::var("REASONING_MODEL") {
            if !model.trim().is_empty() {
                config.model = model;
            }
        }
        if let Ok(bypass) = env::var("BYPASS_JSON_VALIDATION") {
            config.bypass_json_validation =
                matches!(bypass.trim(), "1" | "true" | "TRUE" | "True");
        }
        Ok(config)
    }

    /// Set the base URL of the endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the model id.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of retries on transient failures.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Allow non-structured-output models for the planner.
    #[must_use]
    pub fn with_bypass_json_validation(mut self, bypass: bool) -> Self {
        self.bypass_json_validation = bypass;
        self
    }

    /// Resolve the model to use for a call.
    ///
    /// Callers declare whether the call requires reasoning capability. A
    /// requested model that does not qualify is substituted with the
    /// configured default.
    pub fn resolve_model(&self, requested: Option<&str>, requires_reasoning: bool) -> String {
        match requested {
            Some(model) if !requires_reasoning || is_reasoning_model(model) => model.to_string(),
            Some(model) => {
                log::debug!(
                    "model '{}' does not qualify for reasoning, substituting '{}'",
                    model,
                    self.model
                );
                self.model.clone()
            }
            None => self.model.clone(),
        }
    }

    /// Get the retry delay for a given attempt number (0-indexed)
    ///
    /// Uses exponential backoff: delay = base_delay * 2^attempt, capped at
    /// 60 seconds to prevent overflow and unreasonable waits.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        const MAX_DELAY_MS: u64 = 60_000;

        let delay_ms = self
            .retry_base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt))
            .min(MAX_DELAY_MS);

        Duration::from_millis(delay_ms)
    }
}
