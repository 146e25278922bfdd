//! Deep Research Orchestrator
//!
//! Answers an open-ended research question by coordinating web search,
//! structured extraction, and reasoning-model analysis across successive
//! depth levels until the planner converges or the time budget runs out,
//! then synthesizes everything gathered into a final analysis.
//!
//! # Architecture
//!
//! Each depth is one search → extract → analyze cycle:
//! 1. **Search**: query the search provider, surface every result
//! 2. **Extract**: fan out concurrent extract calls over the top URLs
//!    (plus an optional planner-hinted URL) and gather findings
//! 3. **Analyze**: ask the reasoning model for a continuation plan
//!    (summary, knowledge gaps, next topic, and a continue-or-stop flag)
//!
//! The loop finishes with a single large **synthesis** call whose output
//! becomes the terminal `finish` event.
//!
//! # Example
//!
//! ```no_run
//! use deepscout_core::{ChannelSink, Clients, ResearchContext};
//! use deepscout_research::{ResearchConfig, ResearchOrchestrator};
//!
//! # async fn example(clients: Clients) -> Result<(), deepscout_core::ResearchError> {
//! let orchestrator = ResearchOrchestrator::new(ResearchConfig::default())?;
//! let (sink, mut receiver) = ChannelSink::new();
//!
//! tokio::spawn(async move {
//!     while let Some(event) = receiver.recv().await {
//!         println!("{}", serde_json::to_string(&event).unwrap());
//!     }
//! });
//!
//! let report = orchestrator
//!     .run("How does io_uring work?", ResearchContext::new(clients), &sink)
//!     .await;
//! println!("{} findings", report.findings.len());
//! # Ok(())
//! # }
//! ```

mod agent;
mod config;
mod plan;

pub use agent::{ResearchOrchestrator, ResearchReport};
pub use config::{ResearchConfig, ResearchPrompts};
pub use plan::{parse_plan, planner_response_format, ResearchPlan};
