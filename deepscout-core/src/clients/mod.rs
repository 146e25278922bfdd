//! Provider clients: search, extract, and reasoning.
//!
//! Upstream failures are values, not exceptions. Every provider call
//! returns a structural response with a `success` flag; the research loop
//! branches on it and owns all retry policy. Cancellation is enforced by
//! the caller racing the call future against its token, since dropping the
//! future aborts the in-flight request.

mod firecrawl;
mod reasoning;

pub use firecrawl::FirecrawlClient;
pub use reasoning::ReasoningClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A piece of text the extract provider returned for a URL, paired with
/// that URL as its source. Immutable once appended to the research state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub text: String,
    pub source: String,
}

impl Finding {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
        }
    }
}

/// One result descriptor returned by the search provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Structural outcome of a search call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub success: bool,
    pub results: Vec<SearchResult>,
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn ok(results: Vec<SearchResult>) -> Self {
        Self {
            success: true,
            results,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            results: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Structural outcome of an extract call.
///
/// The client normalizes the provider's one-or-many `data` shape into a
/// flat list and attaches the requesting URL as every finding's source.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractResponse {
    pub success: bool,
    pub findings: Vec<Finding>,
    pub error: Option<String>,
}

impl ExtractResponse {
    pub fn ok(findings: Vec<Finding>) -> Self {
        Self {
            success: true,
            findings,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            findings: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Request to the reasoning model.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ReasoningRequest {
    /// User prompt
    pub prompt: String,

    /// Optional system instruction
    pub system: Option<String>,

    /// Optional structured-output constraint, as a complete OpenAI-style
    /// `response_format` value. Omitted from the wire when the client is
    /// configured to bypass JSON validation.
    pub response_format: Option<serde_json::Value>,

    /// Maximum output tokens for this call
    pub max_output_tokens: u32,
}

impl ReasoningRequest {
    /// Create a new request with just a prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            response_format: None,
            max_output_tokens: 4096,
        }
    }

    /// Set the system instruction.
    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set a structured-output constraint.
    #[must_use]
    pub fn with_response_format(mut self, response_format: serde_json::Value) -> Self {
        self.response_format = Some(response_format);
        self
    }

    /// Set the maximum output tokens.
    #[must_use]
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }
}

/// Structural outcome of a reasoning call.
#[derive(Debug, Clone, PartialEq)]
pub struct ReasoningResponse {
    pub success: bool,
    pub text: String,
    pub error: Option<String>,
}

impl ReasoningResponse {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            text: String::new(),
            error: Some(error.into()),
        }
    }
}

/// Search capability.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> SearchResponse;
}

/// Extract capability: one URL, one extraction prompt.
#[async_trait]
pub trait ExtractProvider: Send + Sync {
    async fn extract(&self, url: &str, prompt: &str) -> ExtractResponse;
}

/// Reasoning-model capability.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    async fn reason(&self, request: ReasoningRequest) -> ReasoningResponse;
}

/// Bundle of the three provider clients, injected at orchestrator
/// construction. Clients are stateless and safe for concurrent calls.
#[derive(Clone)]
pub struct Clients {
    pub search: Arc<dyn SearchProvider>,
    pub extract: Arc<dyn ExtractProvider>,
    pub reasoning: Arc<dyn ReasoningProvider>,
}

impl Clients {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        extract: Arc<dyn ExtractProvider>,
        reasoning: Arc<dyn ReasoningProvider>,
    ) -> Self {
        Self {
            search,
            extract,
            reasoning,
        }
    }
}

/// Shared resources for one research invocation: the client bundle and a
/// cancellation token for cooperative shutdown.
#[derive(Clone)]
pub struct ResearchContext {
    pub clients: Clients,

    /// Hard-cancellation signal. The loop checks it between phases and
    /// races every outbound call against it.
    pub cancellation_token: CancellationToken,
}

impl ResearchContext {
    /// Create a context with a fresh token (never cancelled unless
    /// explicitly triggered).
    pub fn new(clients: Clients) -> Self {
        Self {
            clients,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Create a context with cancellation support.
    ///
    /// Use this when the caller needs to abort in-flight research (e.g.
    /// the enclosing request's hard deadline).
    pub fn with_cancellation(clients: Clients, cancellation_token: CancellationToken) -> Self {
        Self {
            clients,
            cancellation_token,
        }
    }
}
