//! Port interfaces for planning

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use weekplan_domain::{
    CalendarEvent, NewTask, PlanningContext, ProposedEvent, Result, Task, TaskList,
};

/// Calendar and task workspace of one account
///
/// A single client serves every calendar and task list; callers pick the
/// target by identifier.
#[async_trait]
pub trait CalendarWorkspace: Send + Sync {
    /// Make sure a usable credential is available
    ///
    /// Called once before any mutation so that a missing or rejected
    /// credential fails the run instead of every insertion.
    async fn ensure_authenticated(&self) -> Result<()>;

    /// List single event instances starting in `[time_min, time_max)`,
    /// ordered by start time
    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>>;

    /// Insert one event and return its id
    ///
    /// An id held by a live event counts as success with that id. An id
    /// left behind by a deleted event is restored with the given content.
    async fn insert_event(&self, calendar_id: &str, event: &ProposedEvent) -> Result<String>;

    /// List the account's task lists
    async fn list_task_lists(&self) -> Result<Vec<TaskList>>;

    /// List up to `limit` tasks of a list
    async fn list_tasks(&self, list_id: &str, limit: u32) -> Result<Vec<Task>>;

    /// Insert a task into a list
    async fn insert_task(&self, list_id: &str, task: &NewTask) -> Result<Task>;
}

/// Opaque natural-language planning service
#[async_trait]
pub trait PlanningService: Send + Sync {
    /// Submit the context and return the raw response text
    async fn submit(&self, context: &PlanningContext) -> Result<String>;
}
