use thiserror::Error;

/// Top-level error type for the deepscout library
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeepscoutError {
    /// Error from the research orchestrator
    #[error("Research error: {0}")]
    Research(#[from] ResearchError),

    /// Error from a provider client
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors that can occur at the research-orchestrator boundary
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResearchError {
    /// Provider client error during orchestration
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    /// The planner call failed or returned non-success
    #[error("Planner call failed: {0}")]
    PlannerFailed(String),

    /// Failed to parse a planner response into the plan schema
    #[error("Failed to parse planner response: {0}")]
    ParseFailed(String),

    /// The final synthesis call failed
    #[error("Failed to synthesize findings: {0}")]
    SynthesisFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A phase exceeded its time budget
    #[error("Timeout after {elapsed_ms}ms (limit: {timeout_ms}ms) during {phase}")]
    Timeout {
        elapsed_ms: u64,
        timeout_ms: u64,
        phase: String,
    },

    /// Execution was cancelled
    #[error("Execution cancelled")]
    Cancelled,

    /// Other orchestration error
    #[error("{0}")]
    Other(String),
}

impl ResearchError {
    /// Check if this error is retriable (transient failures).
    ///
    /// Returns `true` for errors that might succeed on a later attempt:
    /// timeouts, rate limits, and transport-level client failures.
    pub fn is_retriable(&self) -> bool {
        match self {
            ResearchError::Timeout { .. } => true,
            ResearchError::Client(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ResearchError::Timeout { .. })
    }

    /// Check if execution was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ResearchError::Cancelled)
    }
}

/// Errors that can occur in the provider clients
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Error from the underlying HTTP transport
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timed out
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream service returned a non-success status
    #[error("Upstream returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Response processing error
    #[error("Failed to process response: {0}")]
    ResponseProcessing(String),

    /// No content in response
    #[error("No content in response")]
    NoContent,

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Request was cancelled
    #[error("Request cancelled")]
    Cancelled,

    /// Other client error
    #[error("{0}")]
    Other(String),
}

impl ClientError {
    /// Check if this error is retryable.
    ///
    /// Returns `true` for transient errors that might succeed on retry:
    /// timeouts, rate limits, 5xx upstream statuses, and transport-level
    /// connect/timeout failures.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Timeout(_) => true,
            ClientError::RateLimit(_) => true,
            ClientError::Upstream { status, .. } => *status >= 500,
            ClientError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Check if this is a timeout error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout(_))
    }

    /// Check if the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }
}
