//! Shared test utilities for orchestrator integration tests

#![allow(dead_code)]

use deepscout_core::mock::{MockExtract, MockReasoning, MockSearch};
use deepscout_core::{
    Activity, ActivityStatus, Clients, Event, ExtractResponse, Finding, ReasoningResponse,
    ResearchContext, SearchResponse, SearchResult,
};
use serde_json::json;
use std::sync::Arc;

/// Handles onto the mock providers for post-run assertions.
pub struct TestClients {
    pub search: Arc<MockSearch>,
    pub extract: Arc<MockExtract>,
    pub reasoning: Arc<MockReasoning>,
}

/// Build a research context over scripted mock providers.
pub fn build_context(
    search: Vec<SearchResponse>,
    extract: Vec<(String, ExtractResponse)>,
    reasoning: Vec<ReasoningResponse>,
) -> (ResearchContext, TestClients) {
    let search = Arc::new(MockSearch::new(search));
    let extract = Arc::new(MockExtract::from_pairs(extract));
    let reasoning = Arc::new(MockReasoning::new(reasoning));

    let context = ResearchContext::new(Clients::new(
        search.clone(),
        extract.clone(),
        reasoning.clone(),
    ));

    (
        context,
        TestClients {
            search,
            extract,
            reasoning,
        },
    )
}

/// Search results for the given URLs, with generated titles.
pub fn results(urls: &[&str]) -> Vec<SearchResult> {
    urls.iter()
        .enumerate()
        .map(|(i, url)| SearchResult {
            url: (*url).to_string(),
            title: format!("Result {}", i + 1),
            description: format!("Description {}", i + 1),
        })
        .collect()
}

/// A successful extract response with one finding for the URL.
pub fn one_finding(url: &str, text: &str) -> (String, ExtractResponse) {
    (
        url.to_string(),
        ExtractResponse::ok(vec![Finding::new(text, url)]),
    )
}

/// A successful planner response.
pub fn plan_response(summary: &str, gaps: &[&str], should_continue: bool) -> ReasoningResponse {
    plan_response_with_hints(summary, gaps, should_continue, None, None)
}

/// A successful planner response carrying the optional hints.
pub fn plan_response_with_hints(
    summary: &str,
    gaps: &[&str],
    should_continue: bool,
    next_search_topic: Option<&str>,
    url_to_search: Option<&str>,
) -> ReasoningResponse {
    let mut analysis = json!({
        "summary": summary,
        "gaps": gaps,
        "nextSteps": [],
        "shouldContinue": should_continue,
    });
    if let Some(topic) = next_search_topic {
        analysis["nextSearchTopic"] = json!(topic);
    }
    if let Some(url) = url_to_search {
        analysis["urlToSearch"] = json!(url);
    }
    ReasoningResponse::ok(json!({ "analysis": analysis }).to_string())
}

/// All activity payloads, in emission order.
pub fn activities(events: &[Event]) -> Vec<&Activity> {
    events.iter().filter_map(|e| e.as_activity()).collect()
}

/// Number of activities that reached `complete`.
pub fn completed_count(events: &[Event]) -> usize {
    activities(events)
        .iter()
        .filter(|a| a.status == ActivityStatus::Complete)
        .count()
}

/// Compact one-token label per event, for exact order assertions.
///
/// Extract completions carry identical labels, so the label sequence is
/// deterministic even though fan-out completion order is not.
pub fn labels(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .map(|e| match e {
            Event::ProgressInit { .. } => "progress-init".to_string(),
            Event::DepthDelta { current, .. } => format!("depth-{current}"),
            Event::ActivityDelta(a) => {
                format!("{:?}-{:?}", a.activity_type, a.status).to_lowercase()
            }
            Event::SourceDelta(_) => "source".to_string(),
            Event::Finish { .. } => "finish".to_string(),
        })
        .collect()
}

/// Events serialized to JSON with activity timestamps nulled, for
/// determinism comparisons.
pub fn normalized(events: &[Event]) -> Vec<serde_json::Value> {
    events
        .iter()
        .map(|e| {
            let mut value = serde_json::to_value(e).expect("event serializes");
            if value["type"] == "activity-delta" {
                value["content"]["timestamp"] = serde_json::Value::Null;
            }
            value
        })
        .collect()
}

/// Assert that the per-URL pending activity precedes its matching
/// completion (complete or error) for the given URL/host pair.
pub fn assert_pending_before_completion(events: &[Event], url: &str, host: &str) {
    let activities = activities(events);
    let pending = activities
        .iter()
        .position(|a| a.status == ActivityStatus::Pending && a.message.contains(url))
        .unwrap_or_else(|| panic!("no pending activity for {url}"));
    let completion = activities
        .iter()
        .position(|a| a.status != ActivityStatus::Pending && a.message.contains(host))
        .unwrap_or_else(|| panic!("no completion activity for {host}"));
    assert!(
        pending < completion,
        "pending for {url} should precede its completion"
    );
}
