//! Scripted mock providers for replaying recorded upstream responses.
//!
//! The mocks advance through queued responses in order (search, reasoning)
//! or answer by URL (extract), enabling:
//!
//! - **Offline testing**: run the orchestrator without network access
//! - **Deterministic testing**: identical scripts produce identical event
//!   streams, proving determinism given the external responses
//! - **Failure injection**: script structural failures at any step
//!
//! # Example
//!
//! ```
//! use deepscout_core::mock::MockSearch;
//! use deepscout_core::{SearchProvider, SearchResponse};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mock = MockSearch::new(vec![SearchResponse::ok(vec![])]);
//! let response = mock.search("anything").await;
//! assert!(response.success);
//! assert!(mock.is_exhausted());
//! # }
//! ```

use crate::clients::{
    ExtractProvider, ExtractResponse, ReasoningProvider, ReasoningRequest, ReasoningResponse,
    SearchProvider, SearchResponse,
};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Mock search provider replaying queued responses in call order.
pub struct MockSearch {
    responses: Vec<SearchResponse>,
    cursor: AtomicUsize,
    delay: Option<Duration>,
    queries: Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn new(responses: Vec<SearchResponse>) -> Self {
        Self {
            responses,
            cursor: AtomicUsize::new(0),
            delay: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Add a fixed latency before each response, for deadline tests.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queries received so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().expect("mock lock poisoned").clone()
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Whether every scripted response has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.calls() >= self.responses.len()
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, query: &str) -> SearchResponse {
        self.queries
            .lock()
            .expect("mock lock poisoned")
            .push(query.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(index)
            .cloned()
            .unwrap_or_else(|| SearchResponse::failure("mock search script exhausted"))
    }
}

/// Mock extract provider answering by URL.
///
/// Fan-out completion order is scheduler-dependent, so extract responses
/// are keyed by URL rather than queued; unknown URLs get a scripted
/// structural failure.
pub struct MockExtract {
    by_url: HashMap<String, ExtractResponse>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockExtract {
    pub fn new(by_url: HashMap<String, ExtractResponse>) -> Self {
        Self {
            by_url,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Build from `(url, response)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, ExtractResponse)>) -> Self {
        Self::new(pairs.into_iter().collect())
    }

    /// Add a fixed latency before each response.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs extracted so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl ExtractProvider for MockExtract {
    async fn extract(&self, url: &str, _prompt: &str) -> ExtractResponse {
        self.calls
            .lock()
            .expect("mock lock poisoned")
            .push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.by_url
            .get(url)
            .cloned()
            .unwrap_or_else(|| ExtractResponse::failure(format!("no scripted response for {url}")))
    }
}

/// Mock reasoning provider replaying queued responses in call order.
///
/// Records every request so tests can assert on rendered prompts.
pub struct MockReasoning {
    responses: Vec<ReasoningResponse>,
    cursor: AtomicUsize,
    delay: Option<Duration>,
    requests: Mutex<Vec<ReasoningRequest>>,
}

impl MockReasoning {
    pub fn new(responses: Vec<ReasoningResponse>) -> Self {
        Self {
            responses,
            cursor: AtomicUsize::new(0),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Add a fixed latency before each response.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ReasoningRequest> {
        self.requests.lock().expect("mock lock poisoned").clone()
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Whether every scripted response has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.calls() >= self.responses.len()
    }
}

#[async_trait]
impl ReasoningProvider for MockReasoning {
    async fn reason(&self, request: ReasoningRequest) -> ReasoningResponse {
        self.requests
            .lock()
            .expect("mock lock poisoned")
            .push(request);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(index)
            .cloned()
            .unwrap_or_else(|| ReasoningResponse::failure("mock reasoning script exhausted"))
    }
}
