//! Planning context, proposals and commit outcomes

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::{CalendarEvent, DaySummary, Task};
use crate::errors::PlanError;

/// Everything the planning service gets to see for one run
///
/// Built fresh per run and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningContext {
    /// Remaining days of the week, today through Sunday
    pub days: Vec<DaySummary>,
    /// Primary-calendar events for the rest of the week, ordered by start
    pub existing_events: Vec<CalendarEvent>,
    /// AI-calendar events of the lookahead window, keyed by start
    #[serde(rename = "existingAIEvents")]
    pub existing_ai_events: BTreeMap<String, CalendarEvent>,
    /// Tasks keyed by title
    pub tasks: BTreeMap<String, Task>,
    pub preferences: String,
    pub today_name: Weekday,
    /// Day of the month
    pub today_date: u32,
    pub today: NaiveDate,
    /// IANA zone the proposed events should be expressed in
    pub time_zone: String,
}

impl PlanningContext {
    /// True when the AI calendar already holds events for the window
    pub fn is_already_planned(&self) -> bool {
        !self.existing_ai_events.is_empty()
    }
}

/// Start or end of a proposed event, as the calendar API expects it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: DateTime<FixedOffset>,
    pub time_zone: String,
}

/// One calendar insertion request produced by the planning service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedEvent {
    /// Client-assigned event id; makes retried inserts idempotent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
}

impl ProposedEvent {
    /// Short human label used in logs and failure lists
    pub fn label(&self) -> String {
        format!("{} @ {}", self.summary, self.start.date_time.to_rfc3339())
    }
}

/// What the planning service answered, after parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanResponse {
    AlreadyPlanned,
    Proposed(Vec<ProposedEvent>),
}

/// Result of a single insertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InsertResult {
    Inserted { id: String },
    Failed { reason: String },
}

/// Insertion result paired with the event it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOutcome {
    pub event: ProposedEvent,
    pub result: InsertResult,
    pub attempts: u32,
}

impl EventOutcome {
    /// True when the insertion succeeded
    pub fn is_inserted(&self) -> bool {
        matches!(self.result, InsertResult::Inserted { .. })
    }
}

/// Per-event outcomes of a commit, in proposal order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReport {
    pub outcomes: Vec<EventOutcome>,
}

impl CommitReport {
    pub fn new(outcomes: Vec<EventOutcome>) -> Self {
        Self { outcomes }
    }

    /// Number of inserted events
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_inserted()).count()
    }

    /// Labels and reasons of the failed insertions
    pub fn failed(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match &outcome.result {
                InsertResult::Failed { reason } => {
                    Some(format!("{}: {reason}", outcome.event.label()))
                }
                InsertResult::Inserted { .. } => None,
            })
            .collect()
    }

    /// Ids of the inserted events, in proposal order
    pub fn inserted_ids(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match &outcome.result {
                InsertResult::Inserted { id } => Some(id.as_str()),
                InsertResult::Failed { .. } => None,
            })
            .collect()
    }

    /// True when every proposal was inserted
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(EventOutcome::is_inserted)
    }

    /// `PartialCommit` error describing the failures, if any
    pub fn partial_error(&self) -> Option<PlanError> {
        if self.is_complete() {
            return None;
        }
        Some(PlanError::PartialCommit { succeeded: self.succeeded(), failed: self.failed() })
    }
}

/// Final outcome of a planning run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "report", rename_all = "snake_case")]
pub enum PlanOutcome {
    AlreadyPlanned,
    Created(CommitReport),
}
