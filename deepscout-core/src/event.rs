//! Typed progress events emitted by the research orchestrator.
//!
//! Every event serializes as `{ "type": ..., "content": ... }` so consumers
//! can dispatch on the tag without knowing each payload shape up front.
//! Helper constructors stamp timestamps and prevent hand-built payloads;
//! typed accessors provide ergonomic reads on the consumer side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single progress event on the research stream.
///
/// The stream obeys a strict grammar: `progress-init` is always first,
/// `finish` is always last, and a `depth-delta` precedes every event of
/// that depth.
///
/// # Example
///
/// ```
/// use deepscout_core::Event;
///
/// let event = Event::progress_init(7, 35);
/// let json = serde_json::to_string(&event).unwrap();
/// assert!(json.contains("\"progress-init\""));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "kebab-case")]
pub enum Event {
    /// First event of every invocation: the fixed progress envelope.
    #[serde(rename_all = "camelCase")]
    ProgressInit { max_depth: u32, total_steps: u32 },

    /// A new depth level has been entered.
    #[serde(rename_all = "camelCase")]
    DepthDelta {
        current: u32,
        max: u32,
        completed_steps: u32,
        total_steps: u32,
    },

    /// One observable unit of work changed status.
    ActivityDelta(Activity),

    /// A source surfaced by the search provider.
    SourceDelta(Source),

    /// Terminal event carrying the final synthesis text.
    Finish { content: String },
}

/// The kind of work an activity event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Search,
    Extract,
    Analyze,
    Reasoning,
    Synthesis,
    Thought,
}

/// Status of one activity.
///
/// `Complete` transitions are the only ones counted into the progress
/// counter; errored activities do not count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Pending,
    Complete,
    Error,
}

/// One observable unit of work, stamped with the progress counters as they
/// stood when the event was emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub status: ActivityStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub depth: u32,
    pub completed_steps: u32,
    pub total_steps: u32,
}

/// A search result surfaced to the consumer.
///
/// Weak reference only: findings never own their source descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub title: String,
    pub description: String,
}

impl Event {
    /// Create the progress-init event.
    pub fn progress_init(max_depth: u32, total_steps: u32) -> Self {
        Event::ProgressInit {
            max_depth,
            total_steps,
        }
    }

    /// Create a depth-delta event.
    pub fn depth_delta(current: u32, max: u32, completed_steps: u32, total_steps: u32) -> Self {
        Event::DepthDelta {
            current,
            max,
            completed_steps,
            total_steps,
        }
    }

    /// Create an activity-delta event stamped with the current time.
    pub fn activity(
        activity_type: ActivityType,
        status: ActivityStatus,
        message: impl Into<String>,
        depth: u32,
        completed_steps: u32,
        total_steps: u32,
    ) -> Self {
        Event::ActivityDelta(Activity {
            activity_type,
            status,
            message: message.into(),
            timestamp: Utc::now(),
            depth,
            completed_steps,
            total_steps,
        })
    }

    /// Create a source-delta event.
    pub fn source(
        url: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Event::SourceDelta(Source {
            url: url.into(),
            title: title.into(),
            description: description.into(),
        })
    }

    /// Create the terminal finish event.
    pub fn finish(content: impl Into<String>) -> Self {
        Event::Finish {
            content: content.into(),
        }
    }

    /// Typed accessor for activity-delta events.
    pub fn as_activity(&self) -> Option<&Activity> {
        match self {
            Event::ActivityDelta(activity) => Some(activity),
            _ => None,
        }
    }

    /// Typed accessor for source-delta events.
    pub fn as_source(&self) -> Option<&Source> {
        match self {
            Event::SourceDelta(source) => Some(source),
            _ => None,
        }
    }

    /// Typed accessor for the finish event's synthesis text.
    pub fn as_finish(&self) -> Option<&str> {
        match self {
            Event::Finish { content } => Some(content),
            _ => None,
        }
    }

    /// True for `depth-delta` events at the given depth.
    pub fn is_depth_delta(&self, depth: u32) -> bool {
        matches!(self, Event::DepthDelta { current, .. } if *current == depth)
    }
}
