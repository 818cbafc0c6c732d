//! Calendar window and task readers

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use weekplan_domain::{CalendarEvent, PlanError, Result, Task};

use super::ports::CalendarWorkspace;

/// Reads the primary calendar for context and the AI-plan calendar for the
/// "already planned" check
pub struct CalendarWindowReader {
    workspace: Arc<dyn CalendarWorkspace>,
    ai_calendar_id: String,
    lookahead: Duration,
}

impl CalendarWindowReader {
    /// Reader whose AI-window check covers `lookahead` from the given instant
    pub fn new(
        workspace: Arc<dyn CalendarWorkspace>,
        ai_calendar_id: impl Into<String>,
        lookahead: Duration,
    ) -> Self {
        Self { workspace, ai_calendar_id: ai_calendar_id.into(), lookahead }
    }

    /// Events of `calendar_id` starting in `[from, to)`, ordered by start
    ///
    /// # Errors
    /// Propagates transport and authentication failures; an empty calendar
    /// is `Ok(vec![])`.
    pub async fn read_window(
        &self,
        calendar_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        if to <= from {
            return Ok(Vec::new());
        }
        let mut events = self.workspace.list_events(calendar_id, from, to).await?;
        events.sort_by_key(|event| event.start.instant());
        debug!(calendar_id, count = events.len(), "Read calendar window");
        Ok(events)
    }

    /// AI-plan calendar events over the lookahead window, keyed by start
    ///
    /// # Errors
    /// Propagates transport and authentication failures.
    pub async fn read_ai_window(
        &self,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<String, CalendarEvent>> {
        let events = self.read_window(&self.ai_calendar_id, now, now + self.lookahead).await?;
        Ok(events.into_iter().map(|event| (event.key(), event)).collect())
    }
}

/// Reads the task list into a title-keyed map
pub struct TaskReader {
    workspace: Arc<dyn CalendarWorkspace>,
}

impl TaskReader {
    /// Reader over the workspace's task lists
    pub fn new(workspace: Arc<dyn CalendarWorkspace>) -> Self {
        Self { workspace }
    }

    /// Tasks of `task_list_id` keyed by title; the last duplicate title wins
    ///
    /// A list that does not exist reads as empty.
    ///
    /// # Errors
    /// Propagates transport and authentication failures.
    pub async fn read_tasks(
        &self,
        task_list_id: &str,
        limit: u32,
    ) -> Result<BTreeMap<String, Task>> {
        let tasks = match self.workspace.list_tasks(task_list_id, limit).await {
            Ok(tasks) => tasks,
            Err(PlanError::Api { status: 404, .. }) => {
                warn!(task_list_id, "Task list not found, continuing without tasks");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        debug!(task_list_id, count = tasks.len(), "Read task list");
        Ok(tasks.into_iter().map(|task| (task.title.clone(), task)).collect())
    }
}
