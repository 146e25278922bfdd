//! # Deepscout Core
//!
//! Core abstractions for the Deepscout research orchestrator: the typed
//! event stream, the event sink, the provider clients (search, extract,
//! reasoning), and their configuration.
//!
//! ## Architecture
//!
//! - **Streaming-first**: the orchestrator reports progress as typed events
//!   on an [`EventSink`]; consumers read them live from an [`EventReceiver`]
//! - **Failures are values**: provider calls return structural
//!   `{success, data, error}` responses; the research loop branches on
//!   `success` and owns all retry policy
//! - **Injected everything**: config and clients are passed in at
//!   construction; environment variables are read once via `from_env`
//!
//! ## Example
//!
//! ```no_run
//! use deepscout_core::{
//!     Clients, FirecrawlClient, FirecrawlConfig, ReasoningClient, ReasoningConfig,
//!     ResearchContext,
//! };
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), deepscout_core::DeepscoutError> {
//! let firecrawl = Arc::new(FirecrawlClient::new(FirecrawlConfig::from_env()?)?);
//! let reasoning = Arc::new(ReasoningClient::new(ReasoningConfig::from_env()?)?);
//! let context = ResearchContext::new(Clients::new(
//!     firecrawl.clone(),
//!     firecrawl,
//!     reasoning,
//! ));
//! # Ok(())
//! # }
//! ```

pub mod clients;
pub mod config;
pub mod error;
pub mod event;
pub mod mock;
pub mod sink;
pub mod util;

// Re-export public API
pub use clients::{
    Clients, ExtractProvider, ExtractResponse, Finding, FirecrawlClient, ReasoningClient,
    ReasoningProvider, ReasoningRequest, ReasoningResponse, ResearchContext, SearchProvider,
    SearchResponse, SearchResult,
};
pub use config::{
    is_reasoning_model, FirecrawlConfig, ReasoningConfig, DEFAULT_REASONING_MODEL,
};
pub use error::{ClientError, DeepscoutError, ResearchError};
pub use event::{Activity, ActivityStatus, ActivityType, Event, Source};
pub use sink::{ChannelSink, EventReceiver, EventSink, MemorySink, DEFAULT_EVENT_BUFFER};
