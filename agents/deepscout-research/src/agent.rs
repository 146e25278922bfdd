//! Research orchestrator implementation.
//!
//! Drives search → extract → analyze cycles across depth levels under a
//! wall-clock budget, then finalizes with a single synthesis call. All
//! progress is reported as typed events on the injected sink; the return
//! value is always a structural report, never a propagated error.

use crate::config::ResearchConfig;
use crate::plan::{parse_plan, planner_response_format, ResearchPlan};

use deepscout_core::util::host_of;
use deepscout_core::{
    ActivityStatus, ActivityType, Event, EventSink, ExtractResponse, Finding, ReasoningRequest,
    ResearchContext, ResearchError, SearchResult,
};

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Instant;
use tokio::sync::mpsc;

/// Buffer size for the channel collecting extract fan-out results.
///
/// Must be at least the fan-out width (3 search URLs + 1 hinted URL) so a
/// finished task never blocks behind unread siblings.
const EXTRACT_CHANNEL_BUFFER: usize = 8;

/// Output-token budget for planner calls.
const PLANNER_MAX_OUTPUT_TOKENS: u32 = 4096;

/// Output-token budget for the final synthesis call.
///
/// Reasoning models spend part of this thinking; the budget is sized so a
/// long report still fits.
const SYNTHESIS_MAX_OUTPUT_TOKENS: u32 = 16_384;

/// Structural result of one research invocation.
///
/// Accumulated findings are always included, on failure paths too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchReport {
    pub success: bool,
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub completed_steps: u32,
    pub total_steps: u32,
}

/// The deep-research orchestrator.
///
/// Owns only its configuration; per-invocation state lives and dies inside
/// [`run`](Self::run). Safe to share and reuse across invocations.
///
/// # Example
///
/// ```no_run
/// use deepscout_core::{ChannelSink, Clients, ResearchContext};
/// use deepscout_research::{ResearchConfig, ResearchOrchestrator};
///
/// # async fn example(clients: Clients) -> Result<(), deepscout_core::ResearchError> {
/// let orchestrator = ResearchOrchestrator::new(ResearchConfig::default())?;
/// let context = ResearchContext::new(clients);
/// let (sink, mut receiver) = ChannelSink::new();
///
/// let handle = tokio::spawn(async move {
///     while let Some(event) = receiver.recv().await {
///         println!("{}", serde_json::to_string(&event).unwrap());
///     }
/// });
///
/// let report = orchestrator.run("What is io_uring?", context, &sink).await;
/// drop(sink);
/// handle.await.unwrap();
/// println!("success: {}", report.success);
/// # Ok(())
/// # }
/// ```
pub struct ResearchOrchestrator {
    config: ResearchConfig,
}

impl ResearchOrchestrator {
    /// Create an orchestrator with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `ResearchError::InvalidConfig` if the configuration is
    /// invalid (zero time limit, empty prompts, missing placeholders).
    pub fn new(config: ResearchConfig) -> Result<Self, ResearchError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Run one research invocation.
    ///
    /// Emits `progress-init`, then up to `max_depth` search→extract→analyze
    /// cycles, then the synthesis and `finish` events. Never panics and
    /// never returns early without a report: every failure path terminates
    /// in a `success: false` report carrying the findings gathered so far.
    pub async fn run(
        &self,
        topic: &str,
        context: ResearchContext,
        sink: &dyn EventSink,
    ) -> ResearchReport {
        let total_steps = self.config.total_expected_steps();
        if topic.trim().is_empty() {
            return ResearchReport {
                success: false,
                findings: Vec::new(),
                analysis: None,
                error: Some("topic cannot be empty".to_string()),
                completed_steps: 0,
                total_steps,
            };
        }

        let driver = Driver {
            config: &self.config,
            context,
            sink,
            state: ResearchState::new(topic, total_steps),
            started: Instant::now(),
        };
        driver.run().await
    }
}

// ============================================================================
// Private implementation details
// ============================================================================

/// Mutable per-invocation state, owned exclusively by the driver.
struct ResearchState {
    original_topic: String,
    current_topic: String,
    next_search_topic: Option<String>,
    url_to_search: Option<String>,
    findings: Vec<Finding>,
    summaries: Vec<String>,
    current_depth: u32,
    failed_attempts: u32,
    completed_steps: u32,
    total_steps: u32,
}

impl ResearchState {
    fn new(topic: &str, total_steps: u32) -> Self {
        Self {
            original_topic: topic.to_string(),
            current_topic: topic.to_string(),
            next_search_topic: None,
            url_to_search: None,
            findings: Vec::new(),
            summaries: Vec::new(),
            current_depth: 0,
            failed_attempts: 0,
            completed_steps: 0,
            total_steps,
        }
    }
}

/// Outcome of a retryable phase (search, analyze).
enum PhaseOutcome<T> {
    /// The phase succeeded
    Proceed(T),
    /// Transient failure, attempts remain: skip to the next iteration
    Retry,
    /// Attempts exhausted or execution cancelled: leave the loop
    Abort,
}

struct Driver<'a> {
    config: &'a ResearchConfig,
    context: ResearchContext,
    sink: &'a dyn EventSink,
    state: ResearchState,
    started: Instant,
}

impl Driver<'_> {
    async fn run(mut self) -> ResearchReport {
        self.emit(Event::progress_init(self.config.max_depth, self.state.total_steps))
            .await;

        while self.state.current_depth < self.config.max_depth {
            if self.started.elapsed() >= self.config.time_limit {
                log::debug!(
                    "time limit reached after {} depths, moving to synthesis",
                    self.state.current_depth
                );
                break;
            }
            if self.context.cancellation_token.is_cancelled() {
                break;
            }

            self.state.current_depth += 1;
            self.emit(Event::depth_delta(
                self.state.current_depth,
                self.config.max_depth,
                self.state.completed_steps,
                self.state.total_steps,
            ))
            .await;

            let results = match self.search_phase().await {
                PhaseOutcome::Proceed(results) => results,
                PhaseOutcome::Retry => continue,
                PhaseOutcome::Abort => break,
            };

            self.extract_phase(&results).await;

            let plan = match self.analyze_phase().await {
                PhaseOutcome::Proceed(plan) => plan,
                PhaseOutcome::Retry => continue,
                PhaseOutcome::Abort => break,
            };

            // The planner is the sole continuation input: an explicit stop
            // wins even when gaps remain.
            if !plan.should_continue || plan.gaps.is_empty() {
                break;
            }
            self.state.current_topic = plan.gaps[0].clone();
        }

        self.synthesize().await
    }

    /// Search for the current topic, surfacing every result as a source.
    async fn search_phase(&mut self) -> PhaseOutcome<Vec<SearchResult>> {
        let search_topic = self
            .state
            .next_search_topic
            .clone()
            .unwrap_or_else(|| self.state.current_topic.clone());

        self.emit_activity(
            ActivityType::Search,
            ActivityStatus::Pending,
            format!("Searching for {search_topic}"),
        )
        .await;

        let search = self.context.clients.search.clone();
        let response = match self.race(search.search(&search_topic)).await {
            Ok(response) => response,
            Err(_) => return PhaseOutcome::Abort,
        };

        if !response.success {
            let error = response
                .error
                .unwrap_or_else(|| "unknown search failure".to_string());
            self.emit_activity(
                ActivityType::Search,
                ActivityStatus::Error,
                format!("Search failed for {search_topic}: {error}"),
            )
            .await;
            return self.register_failure();
        }

        self.emit_activity(
            ActivityType::Search,
            ActivityStatus::Complete,
            format!("Found {} results", response.results.len()),
        )
        .await;

        for result in &response.results {
            self.emit(Event::source(
                result.url.clone(),
                result.title.clone(),
                result.description.clone(),
            ))
            .await;
        }

        PhaseOutcome::Proceed(response.results)
    }

    /// Fan out extract calls over the hinted URL plus the first search
    /// results. Per-URL failures are swallowed; each URL contributes its
    /// own pending and completion events.
    async fn extract_phase(&mut self, results: &[SearchResult]) {
        let mut urls: Vec<String> = Vec::new();
        if let Some(hint) = self.state.url_to_search.clone() {
            urls.push(hint);
        }
        urls.extend(
            results
                .iter()
                .take(self.config.max_extract_urls)
                .map(|r| r.url.clone()),
        );
        // Hints are normalized at the parse boundary; search results can
        // still hand back blanks.
        urls.retain(|url| !url.trim().is_empty());

        if urls.is_empty() {
            return;
        }

        let prompt = self.config.prompts.render_extract(&self.state.current_topic);
        let (tx, mut rx) = mpsc::channel::<(String, ExtractResponse)>(EXTRACT_CHANNEL_BUFFER);

        for url in urls {
            self.emit_activity(
                ActivityType::Extract,
                ActivityStatus::Pending,
                format!("Extracting from {url}"),
            )
            .await;

            let tx = tx.clone();
            let extract = self.context.clients.extract.clone();
            let prompt = prompt.clone();
            let token = self.context.cancellation_token.clone();

            tokio::spawn(async move {
                let response = tokio::select! {
                    biased;

                    _ = token.cancelled() => {
                        log::debug!("extract for {} cancelled", url);
                        return;
                    }

                    response = extract.extract(&url, &prompt) => response,
                };

                if tx.send((url, response)).await.is_err() {
                    log::debug!("receiver dropped, extract result discarded");
                }
            });
        }

        // Close the channel once all tasks have finished or bailed out
        drop(tx);

        while let Some((url, response)) = rx.recv().await {
            if response.success {
                let count = response.findings.len();
                self.emit_activity(
                    ActivityType::Extract,
                    ActivityStatus::Complete,
                    format!("Extracted {count} findings from {}", host_of(&url)),
                )
                .await;
                self.state.findings.extend(response.findings);
            } else {
                let error = response
                    .error
                    .unwrap_or_else(|| "unknown extract failure".to_string());
                self.emit_activity(
                    ActivityType::Extract,
                    ActivityStatus::Error,
                    format!("Extraction failed for {}: {error}", host_of(&url)),
                )
                .await;
            }
        }
    }

    /// Ask the planner for a continuation plan over the current findings.
    async fn analyze_phase(&mut self) -> PhaseOutcome<ResearchPlan> {
        self.emit_activity(
            ActivityType::Analyze,
            ActivityStatus::Pending,
            "Analyzing findings",
        )
        .await;

        let remaining = self.config.time_limit.saturating_sub(self.started.elapsed());
        let minutes = format!("{:.1}", remaining.as_secs_f64() / 60.0);
        let findings = format_findings(&self.state.findings);
        let prompt =
            self.config
                .prompts
                .render_planner(&self.state.original_topic, &minutes, &findings);

        let request = ReasoningRequest::new(prompt)
            .with_system(self.config.prompts.planner_system.clone())
            .with_response_format(planner_response_format())
            .with_max_output_tokens(PLANNER_MAX_OUTPUT_TOKENS);

        let reasoning = self.context.clients.reasoning.clone();
        let response = match self.race(reasoning.reason(request)).await {
            Ok(response) => response,
            Err(_) => return PhaseOutcome::Abort,
        };

        if !response.success {
            let error = response
                .error
                .unwrap_or_else(|| "unknown planner failure".to_string());
            self.emit_activity(
                ActivityType::Analyze,
                ActivityStatus::Error,
                format!("Analysis failed: {error}"),
            )
            .await;
            return self.register_failure();
        }

        let plan = match parse_plan(&response.text) {
            Ok(plan) => plan,
            Err(error) => {
                self.emit_activity(
                    ActivityType::Analyze,
                    ActivityStatus::Error,
                    format!("Analysis failed: {error}"),
                )
                .await;
                return self.register_failure();
            }
        };

        self.state.next_search_topic = plan.next_search_topic.clone();
        self.state.url_to_search = plan.url_to_search.clone();
        self.state.summaries.push(plan.summary.clone());

        self.emit_activity(
            ActivityType::Analyze,
            ActivityStatus::Complete,
            plan.summary.clone(),
        )
        .await;

        PhaseOutcome::Proceed(plan)
    }

    /// Final reasoning call over everything gathered, then the finish event.
    async fn synthesize(mut self) -> ResearchReport {
        self.emit_activity(
            ActivityType::Synthesis,
            ActivityStatus::Pending,
            "Preparing final analysis",
        )
        .await;

        let corpus = format_corpus(&self.state.findings, &self.state.summaries);
        let prompt = self
            .config
            .prompts
            .render_synthesis(&self.state.original_topic, &corpus);
        let request = ReasoningRequest::new(prompt)
            .with_system(self.config.prompts.synthesis_system.clone())
            .with_max_output_tokens(SYNTHESIS_MAX_OUTPUT_TOKENS);

        let reasoning = self.context.clients.reasoning.clone();
        let response = match self.race(reasoning.reason(request)).await {
            Ok(response) => response,
            Err(_) => return self.fail(ResearchError::Cancelled).await,
        };

        if !response.success || response.text.trim().is_empty() {
            let error = response
                .error
                .unwrap_or_else(|| "empty synthesis response".to_string());
            return self.fail(ResearchError::SynthesisFailed(error)).await;
        }

        self.emit_activity(
            ActivityType::Synthesis,
            ActivityStatus::Complete,
            "Research completed",
        )
        .await;
        self.emit(Event::finish(response.text.clone())).await;

        ResearchReport {
            success: true,
            findings: self.state.findings,
            analysis: Some(response.text),
            error: None,
            completed_steps: self.state.completed_steps,
            total_steps: self.state.total_steps,
        }
    }

    async fn fail(mut self, error: ResearchError) -> ResearchReport {
        let message = error.to_string();
        self.emit_activity(
            ActivityType::Thought,
            ActivityStatus::Error,
            format!("Research failed: {message}"),
        )
        .await;

        ResearchReport {
            success: false,
            findings: self.state.findings,
            analysis: None,
            error: Some(message),
            completed_steps: self.state.completed_steps,
            total_steps: self.state.total_steps,
        }
    }

    /// Count a search/planner failure toward the cumulative cap.
    fn register_failure<T>(&mut self) -> PhaseOutcome<T> {
        self.state.failed_attempts += 1;
        if self.state.failed_attempts >= self.config.max_failed_attempts {
            log::warn!(
                "aborting research loop after {} failed attempts",
                self.state.failed_attempts
            );
            PhaseOutcome::Abort
        } else {
            PhaseOutcome::Retry
        }
    }

    /// Race an outbound call against the hard cancellation signal.
    ///
    /// Dropping the call future aborts the in-flight request.
    async fn race<T>(&self, future: impl Future<Output = T>) -> Result<T, ResearchError> {
        tokio::select! {
            biased;

            _ = self.context.cancellation_token.cancelled() => {
                Err(ResearchError::Cancelled)
            }

            value = future => Ok(value),
        }
    }

    async fn emit(&self, event: Event) {
        self.sink.emit(event).await;
    }

    /// Emit an activity stamped with the progress counters.
    ///
    /// Every `complete` transition advances the counter, so the returned
    /// `completed_steps` always equals the number of complete activities
    /// the sink observed.
    async fn emit_activity(
        &mut self,
        activity_type: ActivityType,
        status: ActivityStatus,
        message: impl Into<String>,
    ) {
        if status == ActivityStatus::Complete {
            self.state.completed_steps += 1;
        }
        self.sink
            .emit(Event::activity(
                activity_type,
                status,
                message,
                self.state.current_depth,
                self.state.completed_steps,
                self.state.total_steps,
            ))
            .await;
    }
}

/// Format findings for planner and synthesis prompts.
fn format_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| format!("[From {}]: {}", f.source, f.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format findings plus interim summaries for the synthesis prompt.
fn format_corpus(findings: &[Finding], summaries: &[String]) -> String {
    let mut lines: Vec<String> = findings
        .iter()
        .map(|f| format!("[From {}]: {}", f.source, f.text))
        .collect();
    lines.extend(summaries.iter().map(|s| format!("[Summary]: {s}")));
    lines.join("\n")
}
