//! Planner contract: the structured continuation plan returned by the
//! reasoning model, its JSON schema, and a tolerant parser.

use deepscout_core::util::truncate_with_count;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// The planner's structured continuation plan.
///
/// `next_search_topic` and `url_to_search` use empty-means-absent
/// semantics on the wire; [`parse_plan`] normalizes empty strings to
/// `None` so the loop never has to distinguish "planner returned empty"
/// from "planner omitted the field".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchPlan {
    pub summary: String,

    #[serde(default)]
    pub gaps: Vec<String>,

    #[serde(default)]
    pub next_steps: Vec<String>,

    pub should_continue: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_search_topic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_to_search: Option<String>,
}

#[derive(Deserialize)]
struct PlanEnvelope {
    analysis: ResearchPlan,
}

impl ResearchPlan {
    fn normalized(mut self) -> Self {
        self.next_search_topic = self
            .next_search_topic
            .filter(|topic| !topic.trim().is_empty());
        self.url_to_search = self.url_to_search.filter(|url| !url.trim().is_empty());
        self
    }
}

/// The OpenAI-style `response_format` value constraining planner output.
pub fn planner_response_format() -> serde_json::Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "research_plan",
            "schema": {
                "type": "object",
                "properties": {
                    "analysis": {
                        "type": "object",
                        "properties": {
                            "summary": {"type": "string"},
                            "gaps": {"type": "array", "items": {"type": "string"}},
                            "nextSteps": {"type": "array", "items": {"type": "string"}},
                            "shouldContinue": {"type": "boolean"},
                            "nextSearchTopic": {"type": "string"},
                            "urlToSearch": {"type": "string"}
                        },
                        "required": ["summary", "gaps", "nextSteps", "shouldContinue"],
                        "additionalProperties": false
                    }
                },
                "required": ["analysis"],
                "additionalProperties": false
            }
        }
    })
}

/// Parse a planner response into a [`ResearchPlan`], tolerating common
/// formatting issues from models without structured-output support.
pub fn parse_plan(text: &str) -> Result<ResearchPlan, String> {
    // Fast path: well-formed envelope
    if let Ok(envelope) = serde_json::from_str::<PlanEnvelope>(text) {
        return Ok(envelope.analysis.normalized());
    }

    let trimmed = text.trim();
    if let Ok(envelope) = serde_json::from_str::<PlanEnvelope>(trimmed) {
        return Ok(envelope.analysis.normalized());
    }

    // Bare plan without the envelope
    if let Ok(plan) = serde_json::from_str::<ResearchPlan>(trimmed) {
        return Ok(plan.normalized());
    }

    // Slow path: strip a markdown code fence if present
    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() >= 2 {
            let start = if lines[0].starts_with("```") { 1 } else { 0 };
            let end = if lines.last() == Some(&"```") {
                lines.len() - 1
            } else {
                lines.len()
            };
            let inner = lines[start..end].join("\n");
            if let Ok(envelope) = serde_json::from_str::<PlanEnvelope>(&inner) {
                return Ok(envelope.analysis.normalized());
            }
            if let Ok(plan) = serde_json::from_str::<ResearchPlan>(&inner) {
                return Ok(plan.normalized());
            }
        }
    }

    Err(format!(
        "response does not match the plan schema: {}",
        truncate_with_count(text, 200)
    ))
}
