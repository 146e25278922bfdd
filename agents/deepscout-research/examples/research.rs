//! Run a real research invocation against Firecrawl and an
//! OpenAI-compatible reasoning endpoint.
//!
//! Requires `FIRECRAWL_API_KEY` and `OPENAI_API_KEY`; honors
//! `REASONING_MODEL` and `BYPASS_JSON_VALIDATION`.
//!
//! Usage: cargo run --example research -- "your research question"

use deepscout_core::{
    ChannelSink, Clients, Event, FirecrawlClient, FirecrawlConfig, ReasoningClient,
    ReasoningConfig, ResearchContext,
};
use deepscout_research::{ResearchConfig, ResearchOrchestrator};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let topic = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "What is the current state of post-quantum cryptography?".to_string());

    let firecrawl = Arc::new(FirecrawlClient::new(FirecrawlConfig::from_env()?)?);

    // The planner and synthesizer need reasoning capability; a chat model
    // that does not qualify falls back to the configured default.
    let mut reasoning_config = ReasoningConfig::from_env()?;
    if let Ok(chat_model) = std::env::var("CHAT_MODEL") {
        let resolved = reasoning_config.resolve_model(Some(&chat_model), true);
        reasoning_config = reasoning_config.with_model(resolved);
    }
    let reasoning = Arc::new(ReasoningClient::new(reasoning_config)?);
    let clients = Clients::new(firecrawl.clone(), firecrawl, reasoning);

    let orchestrator = ResearchOrchestrator::new(ResearchConfig::default())?;
    let (sink, mut receiver) = ChannelSink::new();

    let consumer = tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            match &event {
                Event::ActivityDelta(activity) => {
                    println!(
                        "[depth {}] {:?}/{:?}: {}",
                        activity.depth, activity.activity_type, activity.status, activity.message
                    );
                }
                Event::SourceDelta(source) => println!("  source: {}", source.url),
                Event::DepthDelta { current, max, .. } => {
                    println!("=== depth {current}/{max} ===");
                }
                Event::ProgressInit { total_steps, .. } => {
                    println!("starting ({total_steps} expected steps)");
                }
                Event::Finish { .. } => println!("=== finished ==="),
            }
        }
    });

    let report = orchestrator
        .run(&topic, ResearchContext::new(clients), &sink)
        .await;
    drop(sink);
    consumer.await?;

    println!();
    println!(
        "success: {} | findings: {} | steps: {}/{}",
        report.success,
        report.findings.len(),
        report.completed_steps,
        report.total_steps
    );
    if let Some(analysis) = report.analysis {
        println!("\n{analysis}");
    }
    if let Some(error) = report.error {
        eprintln!("error: {error}");
    }

    Ok(())
}
