//! Google API wire types

use chrono::{DateTime, Utc};
use serde::Deserialize;
use weekplan_domain::{CalendarEvent, CalendarSummary, EventTime, Task, TaskStatus};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventsPage {
    #[serde(default)]
    pub items: Vec<GoogleEvent>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleEvent {
    pub id: Option<String>,
    pub status: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<GoogleEventTime>,
    pub end: Option<GoogleEventTime>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleEventTime {
    #[serde(rename = "dateTime")]
    pub date_time: Option<String>,
    pub date: Option<String>,
}

impl GoogleEventTime {
    fn to_event_time(&self) -> Option<EventTime> {
        EventTime::from_parts(self.date_time.as_deref(), self.date.as_deref())
    }
}

impl GoogleEvent {
    /// Deleted events keep their id and come back with this status
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some("cancelled")
    }

    /// Domain event, or `None` for cancelled instances and events without a
    /// readable start
    pub fn into_calendar_event(self) -> Option<CalendarEvent> {
        if self.is_cancelled() {
            return None;
        }
        let start = self.start.as_ref()?.to_event_time()?;
        Some(CalendarEvent {
            start,
            end: self.end.as_ref().and_then(GoogleEventTime::to_event_time),
            summary: self.summary.unwrap_or_default(),
            description: self.description,
            location: self.location,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CalendarListPage {
    #[serde(default)]
    pub items: Vec<CalendarListEntry>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CalendarListEntry {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    pub summary_override: Option<String>,
    #[serde(default)]
    pub primary: bool,
    pub access_role: Option<String>,
}

impl From<CalendarListEntry> for CalendarSummary {
    fn from(entry: CalendarListEntry) -> Self {
        Self {
            id: entry.id,
            summary: entry.summary_override.unwrap_or(entry.summary),
            primary: entry.primary,
            access_role: entry.access_role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct InsertedEvent {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskListsPage {
    #[serde(default)]
    pub items: Vec<GoogleTaskList>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleTaskList {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TasksPage {
    #[serde(default)]
    pub items: Vec<GoogleTask>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleTask {
    #[serde(default)]
    pub title: String,
    pub notes: Option<String>,
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: TaskStatus,
    pub completed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted: bool,
}

impl From<GoogleTask> for Task {
    fn from(task: GoogleTask) -> Self {
        Self {
            title: task.title,
            notes: task.notes,
            due: task.due,
            status: task.status,
            completed: task.completed,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: Option<u64>,
}
