//! Configuration for the research orchestrator.

use deepscout_core::ResearchError;
use std::time::Duration;

/// Required placeholders per template
mod placeholders {
    pub const PLANNER: &[&str] = &["{topic}", "{minutes}", "{findings}"];
    pub const SYNTHESIS: &[&str] = &["{topic}", "{findings}"];
    pub const EXTRACT: &[&str] = &["{topic}"];
}

/// Prompts used by the research orchestrator
///
/// Contains system instructions and user templates for the three
/// reasoning-facing surfaces: the per-URL extraction prompt, the planner,
/// and the final synthesis.
///
/// # Template Placeholders
///
/// - `extract_template`: `{topic}`
/// - `planner_template`: `{topic}`, `{minutes}`, `{findings}`
/// - `synthesis_template`: `{topic}`, `{findings}`
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ResearchPrompts {
    /// Extraction prompt sent with every extract call
    ///
    /// Placeholder: `{topic}`
    pub extract_template: String,

    /// System instruction for planner calls
    pub planner_system: String,

    /// User template for planner calls
    ///
    /// Placeholders: `{topic}`, `{minutes}`, `{findings}`
    pub planner_template: String,

    /// System instruction for the synthesis call
    pub synthesis_system: String,

    /// User template for the synthesis call
    ///
    /// Placeholders: `{topic}`, `{findings}`
    pub synthesis_template: String,
}

impl ResearchPrompts {
    /// Render the extraction prompt for the current topic.
    pub fn render_extract(&self, topic: &str) -> String {
        self.extract_template.replace("{topic}", topic)
    }

    /// Render the planner prompt.
    ///
    /// `{findings}` is replaced last so extracted page text containing a
    /// literal `{topic}` or `{minutes}` is not substituted.
    pub fn render_planner(&self, topic: &str, minutes: &str, findings: &str) -> String {
        self.planner_template
            .replace("{topic}", topic)
            .replace("{minutes}", minutes)
            .replace("{findings}", findings)
    }

    /// Render the synthesis prompt.
    ///
    /// `{findings}` is replaced last, same reasoning as
    /// [`render_planner`](Self::render_planner).
    pub fn render_synthesis(&self, topic: &str, findings: &str) -> String {
        self.synthesis_template
            .replace("{topic}", topic)
            .replace("{findings}", findings)
    }

    /// Validate that all prompts are non-empty and templates contain their
    /// required placeholders.
    pub fn validate(&self) -> Result<(), ResearchError> {
        let mut errors = Vec::new();

        for (name, value) in [
            ("extract_template", &self.extract_template),
            ("planner_system", &self.planner_system),
            ("planner_template", &self.planner_template),
            ("synthesis_system", &self.synthesis_system),
            ("synthesis_template", &self.synthesis_template),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("{name} cannot be empty"));
            }
        }

        for (name, template, required) in [
            (
                "extract_template",
                &self.extract_template,
                placeholders::EXTRACT,
            ),
            (
                "planner_template",
                &self.planner_template,
                placeholders::PLANNER,
            ),
            (
                "synthesis_template",
                &self.synthesis_template,
                placeholders::SYNTHESIS,
            ),
        ] {
            if template.trim().is_empty() {
                continue;
            }
            let missing: Vec<&str> = required
                .iter()
                .filter(|p| !template.contains(*p))
                .copied()
                .collect();
            if !missing.is_empty() {
                errors.push(format!(
                    "{name} missing required placeholders: {}",
                    missing.join(", ")
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ResearchError::InvalidConfig(errors.join("; ")))
        }
    }
}

impl Default for ResearchPrompts {
    fn default() -> Self {
        Self {
            extract_template:
                "Extract key information about {topic}. Focus on facts, data, and expert opinions."
                    .to_string(),
            planner_system:
                "You are an expert research planner. Return only valid JSON matching the requested schema."
                    .to_string(),
            planner_template: r#"You are researching: {topic}

Time remaining: {minutes} minutes. If less than 1 minute remains, set shouldContinue to false.

Current findings:
{findings}

Analyze the findings. Identify knowledge gaps, decide whether further searching is worthwhile, and propose the next search topic. Optionally name one specific URL worth extracting. Respond with JSON:
{"analysis": {"summary": "...", "gaps": ["..."], "nextSteps": ["..."], "shouldContinue": true, "nextSearchTopic": "...", "urlToSearch": "..."}}"#
                .to_string(),
            synthesis_system:
                "You are a research synthesis expert. Provide comprehensive, well-sourced answers."
                    .to_string(),
            synthesis_template: r#"Synthesize the research below into a final analysis.

Research topic: {topic}

Findings and interim summaries:
{findings}

Write a clear, well-organized answer that integrates every relevant finding and cites sources by URL. Do not mention the research process itself."#
                .to_string(),
        }
    }
}

/// Configuration for the research orchestrator
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    /// Maximum number of search → extract → analyze iterations
    ///
    /// Zero is allowed: the loop body never runs and synthesis operates on
    /// an empty findings set.
    ///
    /// Default: 7
    pub max_depth: u32,

    /// Soft wall-clock budget, checked at the top of each iteration
    ///
    /// Chosen below the enclosing request's hard deadline so time remains
    /// for the final synthesis call.
    ///
    /// Default: 4 minutes 30 seconds
    pub time_limit: Duration,

    /// Cumulative search/planner failures tolerated before the loop aborts
    ///
    /// Default: 3
    pub max_failed_attempts: u32,

    /// Number of search-result URLs extracted per depth
    ///
    /// A planner-hinted URL is prepended on top of this cutoff.
    ///
    /// Default: 3
    pub max_extract_urls: usize,

    /// Prompts for the extraction, planner, and synthesis surfaces
    pub prompts: ResearchPrompts,
}

impl ResearchConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ResearchError> {
        let mut errors = Vec::new();

        if self.time_limit.is_zero() {
            errors.push("time_limit must be greater than 0".to_string());
        }

        if self.max_failed_attempts == 0 {
            errors.push("max_failed_attempts must be greater than 0".to_string());
        }

        if self.max_extract_urls == 0 {
            errors.push("max_extract_urls must be greater than 0".to_string());
        }

        if let Err(ResearchError::InvalidConfig(prompt_errors)) = self.prompts.validate() {
            errors.push(prompt_errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ResearchError::InvalidConfig(errors.join("; ")))
        }
    }

    /// Fixed estimate of total loop steps, used for progress reporting.
    ///
    /// Five observable steps per depth is a heuristic, not a contract; the
    /// consumer clamps the resulting percentage.
    pub fn total_expected_steps(&self) -> u32 {
        self.max_depth.saturating_mul(5)
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_depth: 7,
            time_limit: Duration::from_secs(4 * 60 + 30),
            max_failed_attempts: 3,
            max_extract_urls: 3,
            prompts: ResearchPrompts::default(),
        }
    }
}
