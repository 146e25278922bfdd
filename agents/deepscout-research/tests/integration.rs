//! Integration tests for the research orchestrator, driven end-to-end
//! against scripted mock providers. No network access required.

mod common;

use common::{
    activities, assert_pending_before_completion, build_context, completed_count, labels,
    normalized, one_finding, plan_response, plan_response_with_hints, results,
};
use deepscout_core::{
    ActivityStatus, ActivityType, ChannelSink, Clients, Event, ExtractResponse, MemorySink,
    ReasoningResponse, ResearchContext, SearchResponse,
};
use deepscout_research::{ResearchConfig, ResearchOrchestrator};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const URL_A: &str = "https://a.example.com/";
const URL_B: &str = "https://b.example.com/";
const URL_C: &str = "https://c.example.com/";

fn config(max_depth: u32) -> ResearchConfig {
    ResearchConfig {
        max_depth,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_happy_path_depth_one() {
    let (context, mocks) = build_context(
        vec![SearchResponse::ok(results(&[URL_A, URL_B, URL_C]))],
        vec![
            one_finding(URL_A, "fact a"),
            one_finding(URL_B, "fact b"),
            one_finding(URL_C, "fact c"),
        ],
        vec![
            plan_response("covered the basics", &[], false),
            ReasoningResponse::ok("final analysis"),
        ],
    );

    let orchestrator = ResearchOrchestrator::new(config(1)).unwrap();
    let sink = MemorySink::new();
    let report = orchestrator.run("What is X?", context, &sink).await;

    assert!(report.success);
    assert_eq!(report.findings.len(), 3);
    assert_eq!(report.analysis.as_deref(), Some("final analysis"));
    assert!(report.error.is_none());
    assert_eq!(report.total_steps, 5);

    let events = sink.events();
    assert_eq!(
        labels(&events),
        vec![
            "progress-init",
            "depth-1",
            "search-pending",
            "search-complete",
            "source",
            "source",
            "source",
            "extract-pending",
            "extract-pending",
            "extract-pending",
            "extract-complete",
            "extract-complete",
            "extract-complete",
            "analyze-pending",
            "analyze-complete",
            "synthesis-pending",
            "synthesis-complete",
            "finish",
        ]
    );

    // Per-URL pending precedes the matching completion
    assert_pending_before_completion(&events, URL_A, "a.example.com");
    assert_pending_before_completion(&events, URL_B, "b.example.com");
    assert_pending_before_completion(&events, URL_C, "c.example.com");

    // The finish event carries the synthesis text
    assert_eq!(events.last().unwrap().as_finish(), Some("final analysis"));

    // The counter equals the number of complete activities observed
    assert_eq!(report.completed_steps as usize, completed_count(&events));
    assert_eq!(report.completed_steps, 6);

    assert!(mocks.search.is_exhausted());
    assert!(mocks.reasoning.is_exhausted());
}

#[tokio::test]
async fn test_search_failure_then_success() {
    let (context, mocks) = build_context(
        vec![
            SearchResponse::failure("provider down"),
            SearchResponse::ok(results(&[URL_A, URL_B])),
        ],
        vec![one_finding(URL_A, "fact a"), one_finding(URL_B, "fact b")],
        vec![
            plan_response("enough", &[], false),
            ReasoningResponse::ok("final analysis"),
        ],
    );

    let orchestrator = ResearchOrchestrator::new(config(3)).unwrap();
    let sink = MemorySink::new();
    let report = orchestrator.run("What is X?", context, &sink).await;

    assert!(report.success);
    assert_eq!(report.findings.len(), 2);

    let events = sink.events();

    // Depth 1 fails at search, depth 2 completes the full cycle
    assert!(events.iter().any(|e| e.is_depth_delta(1)));
    assert!(events.iter().any(|e| e.is_depth_delta(2)));
    assert!(!events.iter().any(|e| e.is_depth_delta(3)));

    let search_errors: Vec<_> = activities(&events)
        .into_iter()
        .filter(|a| a.activity_type == ActivityType::Search && a.status == ActivityStatus::Error)
        .collect();
    assert_eq!(search_errors.len(), 1);
    assert!(search_errors[0].message.contains("provider down"));

    // Both search responses consumed, one synthesis at the end
    assert_eq!(mocks.search.calls(), 2);
    assert_eq!(mocks.reasoning.calls(), 2);
    assert_eq!(events.last().unwrap().as_finish(), Some("final analysis"));
    assert_eq!(report.completed_steps as usize, completed_count(&events));
}

#[tokio::test]
async fn test_extract_partial_failure() {
    let (context, _mocks) = build_context(
        vec![SearchResponse::ok(results(&[URL_A, URL_B, URL_C]))],
        vec![
            one_finding(URL_A, "fact a"),
            (URL_B.to_string(), ExtractResponse::failure("fetch blocked")),
            one_finding(URL_C, "fact c"),
        ],
        vec![
            plan_response("partial coverage", &[], false),
            ReasoningResponse::ok("final analysis"),
        ],
    );

    let orchestrator = ResearchOrchestrator::new(config(1)).unwrap();
    let sink = MemorySink::new();
    let report = orchestrator.run("What is X?", context, &sink).await;

    assert!(report.success);
    assert_eq!(report.findings.len(), 2);
    assert!(report.findings.iter().all(|f| f.source != URL_B));

    let events = sink.events();
    let extract_errors: Vec<_> = activities(&events)
        .into_iter()
        .filter(|a| a.activity_type == ActivityType::Extract && a.status == ActivityStatus::Error)
        .collect();
    assert_eq!(extract_errors.len(), 1);
    assert!(
        extract_errors[0].message.contains("b.example.com"),
        "error message should name the failing host: {}",
        extract_errors[0].message
    );
    assert!(extract_errors[0].message.contains("fetch blocked"));
}

#[tokio::test]
async fn test_deadline_exhaustion_mid_depth() {
    use deepscout_core::mock::{MockExtract, MockReasoning, MockSearch};
    use std::sync::Arc;

    // First search finishes past the soft deadline; the planner wants to
    // continue, but the top-of-iteration check wins
    let search = Arc::new(
        MockSearch::new(vec![SearchResponse::ok(results(&[URL_A]))])
            .with_delay(Duration::from_millis(80)),
    );
    let extract = Arc::new(MockExtract::from_pairs([one_finding(URL_A, "fact a")]));
    let reasoning = Arc::new(MockReasoning::new(vec![
        plan_response("more to do", &["open gap"], true),
        ReasoningResponse::ok("final analysis"),
    ]));
    let context = ResearchContext::new(Clients::new(
        search,
        extract,
        reasoning.clone(),
    ));

    let orchestrator = ResearchOrchestrator::new(ResearchConfig {
        max_depth: 3,
        time_limit: Duration::from_millis(50),
        ..Default::default()
    })
    .unwrap();

    let sink = MemorySink::new();
    let report = orchestrator.run("What is X?", context, &sink).await;

    // Deadline exhaustion is a normal termination path
    assert!(report.success);
    assert_eq!(report.findings.len(), 1);

    let events = sink.events();
    assert!(events.iter().any(|e| e.is_depth_delta(1)));
    assert!(!events.iter().any(|e| e.is_depth_delta(2)));
    assert_eq!(events.last().unwrap().as_finish(), Some("final analysis"));

    // Planner plus synthesis, nothing more
    assert_eq!(reasoning.calls(), 2);
}

#[tokio::test]
async fn test_planner_stop_wins_over_gaps() {
    let (context, mocks) = build_context(
        vec![SearchResponse::ok(results(&[URL_A]))],
        vec![one_finding(URL_A, "fact a")],
        vec![
            plan_response("done despite gaps", &["g1", "g2"], false),
            ReasoningResponse::ok("final analysis"),
        ],
    );

    let orchestrator = ResearchOrchestrator::new(config(3)).unwrap();
    let sink = MemorySink::new();
    let report = orchestrator.run("What is X?", context, &sink).await;

    assert!(report.success);

    let events = sink.events();
    assert!(events.iter().any(|e| e.is_depth_delta(1)));
    assert!(!events.iter().any(|e| e.is_depth_delta(2)));

    // The loop never searched for a gap topic
    assert_eq!(mocks.search.queries(), vec!["What is X?"]);
    assert_eq!(events.last().unwrap().as_finish(), Some("final analysis"));
}

#[tokio::test]
async fn test_three_consecutive_planner_failures() {
    let (context, mocks) = build_context(
        vec![
            SearchResponse::ok(results(&[URL_A])),
            SearchResponse::ok(results(&[URL_B])),
            SearchResponse::ok(results(&[URL_C])),
        ],
        vec![
            one_finding(URL_A, "fact a"),
            one_finding(URL_B, "fact b"),
            one_finding(URL_C, "fact c"),
        ],
        vec![
            ReasoningResponse::failure("model unavailable"),
            ReasoningResponse::failure("model unavailable"),
            ReasoningResponse::failure("model unavailable"),
            ReasoningResponse::ok("final analysis"),
        ],
    );

    let orchestrator = ResearchOrchestrator::new(config(5)).unwrap();
    let sink = MemorySink::new();
    let report = orchestrator.run("What is X?", context, &sink).await;

    // Loop aborts after the third failure; synthesis still runs over the
    // findings the three extract fan-outs produced
    assert!(report.success);
    assert_eq!(report.findings.len(), 3);

    let events = sink.events();
    assert!(events.iter().any(|e| e.is_depth_delta(3)));
    assert!(!events.iter().any(|e| e.is_depth_delta(4)));

    let analyze_errors = activities(&events)
        .into_iter()
        .filter(|a| a.activity_type == ActivityType::Analyze && a.status == ActivityStatus::Error)
        .count();
    assert_eq!(analyze_errors, 3);

    assert_eq!(mocks.reasoning.calls(), 4);
    assert_eq!(events.last().unwrap().as_finish(), Some("final analysis"));
}

#[tokio::test]
async fn test_zero_depth_synthesizes_empty_corpus() {
    let (context, mocks) = build_context(
        vec![],
        vec![],
        vec![ReasoningResponse::ok("nothing gathered, answering cold")],
    );

    let orchestrator = ResearchOrchestrator::new(config(0)).unwrap();
    let sink = MemorySink::new();
    let report = orchestrator.run("What is X?", context, &sink).await;

    assert!(report.success);
    assert!(report.findings.is_empty());
    assert_eq!(report.total_steps, 0);

    assert_eq!(
        labels(&sink.events()),
        vec![
            "progress-init",
            "synthesis-pending",
            "synthesis-complete",
            "finish",
        ]
    );
    assert_eq!(mocks.search.calls(), 0);
    assert_eq!(mocks.reasoning.calls(), 1);
}

#[tokio::test]
async fn test_zero_search_results_still_plans() {
    let (context, mocks) = build_context(
        vec![SearchResponse::ok(vec![])],
        vec![],
        vec![
            plan_response("nothing found", &[], false),
            ReasoningResponse::ok("final analysis"),
        ],
    );

    let orchestrator = ResearchOrchestrator::new(config(1)).unwrap();
    let sink = MemorySink::new();
    let report = orchestrator.run("What is X?", context, &sink).await;

    assert!(report.success);
    assert!(report.findings.is_empty());

    let events = sink.events();
    assert!(!events.iter().any(|e| e.as_source().is_some()));
    assert!(!activities(&events)
        .iter()
        .any(|a| a.activity_type == ActivityType::Extract));

    // The planner was still invoked over the empty findings set
    assert_eq!(mocks.reasoning.calls(), 2);
    assert_eq!(events.last().unwrap().as_finish(), Some("final analysis"));
}

#[tokio::test]
async fn test_planner_hints_drive_next_depth() {
    let hint = "https://hint.example.com/";
    let d2 = "https://d2.example.com/";
    let (context, mocks) = build_context(
        vec![
            SearchResponse::ok(results(&[URL_A])),
            SearchResponse::ok(results(&[d2])),
        ],
        vec![
            one_finding(URL_A, "fact a"),
            one_finding(hint, "hinted fact"),
            one_finding(d2, "fact d2"),
        ],
        vec![
            plan_response_with_hints(
                "first pass",
                &["gap one"],
                true,
                Some("refined topic"),
                Some(hint),
            ),
            plan_response("second pass", &[], false),
            ReasoningResponse::ok("final analysis"),
        ],
    );

    let orchestrator = ResearchOrchestrator::new(config(3)).unwrap();
    let sink = MemorySink::new();
    let report = orchestrator.run("original topic", context, &sink).await;

    assert!(report.success);
    assert_eq!(report.findings.len(), 3);

    // Depth 2 searches the planner's topic hint, not the gap
    assert_eq!(mocks.search.queries(), vec!["original topic", "refined topic"]);

    // The hinted URL is prepended to depth 2's extract batch
    assert_eq!(mocks.extract.calls(), vec![URL_A, hint, d2]);
}

#[tokio::test]
async fn test_synthesis_failure_returns_findings() {
    let (context, _mocks) = build_context(
        vec![SearchResponse::ok(results(&[URL_A]))],
        vec![one_finding(URL_A, "fact a")],
        vec![
            plan_response("ok", &[], false),
            ReasoningResponse::failure("synthesis model down"),
        ],
    );

    let orchestrator = ResearchOrchestrator::new(config(1)).unwrap();
    let sink = MemorySink::new();
    let report = orchestrator.run("What is X?", context, &sink).await;

    assert!(!report.success);
    assert_eq!(report.findings.len(), 1);
    assert!(report.analysis.is_none());
    assert!(report.error.as_deref().unwrap().contains("synthesis model down"));

    let events = sink.events();
    // Terminal thought-error activity instead of a finish event
    assert!(!events.iter().any(|e| e.as_finish().is_some()));
    let last = activities(&events).pop().unwrap().clone();
    assert_eq!(last.activity_type, ActivityType::Thought);
    assert_eq!(last.status, ActivityStatus::Error);
    assert!(last.message.starts_with("Research failed:"));
}

#[tokio::test]
async fn test_pre_cancelled_token_fails_fast() {
    let (context, mocks) = build_context(
        vec![SearchResponse::ok(results(&[URL_A]))],
        vec![one_finding(URL_A, "fact a")],
        vec![ReasoningResponse::ok("never used")],
    );
    let token = CancellationToken::new();
    token.cancel();
    let context = ResearchContext::with_cancellation(context.clients, token);

    let orchestrator = ResearchOrchestrator::new(config(3)).unwrap();
    let sink = MemorySink::new();
    let report = orchestrator.run("What is X?", context, &sink).await;

    assert!(!report.success);
    assert!(report.error.as_deref().unwrap().contains("cancelled"));
    assert!(report.findings.is_empty());

    // No provider was contacted
    assert_eq!(mocks.search.calls(), 0);
    assert_eq!(mocks.reasoning.calls(), 0);

    let events = sink.events();
    assert!(!events.iter().any(|e| e.as_finish().is_some()));
}

#[tokio::test]
async fn test_planner_prompt_carries_findings_and_minutes() {
    let (context, mocks) = build_context(
        vec![SearchResponse::ok(results(&[URL_A]))],
        vec![one_finding(URL_A, "fact a")],
        vec![
            plan_response("summary one", &[], false),
            ReasoningResponse::ok("final analysis"),
        ],
    );

    let orchestrator = ResearchOrchestrator::new(config(1)).unwrap();
    let sink = MemorySink::new();
    let report = orchestrator.run("What is X?", context, &sink).await;
    assert!(report.success);

    let requests = mocks.reasoning.requests();
    assert_eq!(requests.len(), 2);

    // Planner: topic, remaining minutes to one decimal, findings lines
    let planner = &requests[0];
    assert!(planner.prompt.contains("What is X?"));
    assert!(planner.prompt.contains(&format!("[From {URL_A}]: fact a")));
    assert!(planner.prompt.contains("4.5 minutes") || planner.prompt.contains("4.4 minutes"));
    assert!(planner.response_format.is_some());

    // Synthesizer: findings plus appended summary lines, large budget
    let synthesis = &requests[1];
    assert!(synthesis.prompt.contains(&format!("[From {URL_A}]: fact a")));
    assert!(synthesis.prompt.contains("[Summary]: summary one"));
    assert!(synthesis.response_format.is_none());
    assert!(synthesis.max_output_tokens >= 16_000);
}

#[tokio::test]
async fn test_event_sequence_is_deterministic() {
    let script = || {
        build_context(
            vec![SearchResponse::ok(results(&[URL_A, URL_B]))],
            vec![one_finding(URL_A, "fact a"), one_finding(URL_B, "fact b")],
            vec![
                plan_response("pass", &[], false),
                ReasoningResponse::ok("final analysis"),
            ],
        )
    };

    let orchestrator = ResearchOrchestrator::new(config(1)).unwrap();

    let sink_one = MemorySink::new();
    let (context_one, _) = script();
    let report_one = orchestrator.run("What is X?", context_one, &sink_one).await;

    let sink_two = MemorySink::new();
    let (context_two, _) = script();
    let report_two = orchestrator.run("What is X?", context_two, &sink_two).await;

    assert_eq!(report_one, report_two);
    assert_eq!(normalized(&sink_one.events()), normalized(&sink_two.events()));
}

#[tokio::test]
async fn test_consumer_disconnect_does_not_stall_the_loop() {
    let (context, _mocks) = build_context(
        vec![SearchResponse::ok(results(&[URL_A]))],
        vec![one_finding(URL_A, "fact a")],
        vec![
            plan_response("ok", &[], false),
            ReasoningResponse::ok("final analysis"),
        ],
    );

    let orchestrator = ResearchOrchestrator::new(config(1)).unwrap();
    let (sink, receiver) = ChannelSink::bounded(1);
    drop(receiver);

    let report = orchestrator.run("What is X?", context, &sink).await;

    // The loop ran to completion with its writes elided
    assert!(report.success);
    assert_eq!(report.findings.len(), 1);
    assert!(sink.is_disconnected());
}

#[tokio::test]
async fn test_empty_topic_rejected_structurally() {
    let (context, mocks) = build_context(vec![], vec![], vec![]);

    let orchestrator = ResearchOrchestrator::new(config(1)).unwrap();
    let sink = MemorySink::new();
    let report = orchestrator.run("   ", context, &sink).await;

    assert!(!report.success);
    assert!(report.error.as_deref().unwrap().contains("topic"));
    assert!(sink.is_empty());
    assert_eq!(mocks.reasoning.calls(), 0);
}

#[tokio::test]
async fn test_events_stream_through_channel_sink() {
    use futures_util::StreamExt;

    let (context, _mocks) = build_context(
        vec![SearchResponse::ok(results(&[URL_A]))],
        vec![one_finding(URL_A, "fact a")],
        vec![
            plan_response("ok", &[], false),
            ReasoningResponse::ok("final analysis"),
        ],
    );

    let orchestrator = ResearchOrchestrator::new(config(1)).unwrap();
    let (sink, receiver) = ChannelSink::new();

    let consumer = tokio::spawn(async move { receiver.collect::<Vec<Event>>().await });

    let report = orchestrator.run("What is X?", context, &sink).await;
    drop(sink);

    let events = consumer.await.unwrap();
    assert!(report.success);
    assert_eq!(events.first(), Some(&Event::progress_init(1, 5)));
    assert_eq!(events.last().unwrap().as_finish(), Some("final analysis"));
    assert_eq!(report.completed_steps as usize, completed_count(&events));
}
