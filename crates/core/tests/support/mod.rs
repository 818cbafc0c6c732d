//! Shared test helpers for `weekplan-core` integration tests.
//!
//! In-memory mocks of every port plus small fixture builders, so pipeline
//! and writer tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::json;
use weekplan_core::{CalendarWorkspace, PlanningService, TimetableSource};
use weekplan_domain::{
    CalendarEvent, EventDateTime, EventTime, NewTask, PlanError, PlanningContext, ProposedEvent,
    RawDay, RawHour, RawTimetable, Result, Task, TaskList, TaskStatus,
};

/// Timetable source returning a fixed timetable.
#[derive(Clone, Default)]
pub struct MockTimetableSource {
    timetable: Arc<Mutex<RawTimetable>>,
    calls: Arc<AtomicUsize>,
}

impl MockTimetableSource {
    pub fn new(timetable: RawTimetable) -> Self {
        Self { timetable: Arc::new(Mutex::new(timetable)), calls: Arc::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TimetableSource for MockTimetableSource {
    async fn fetch_timetable(&self, _as_of: NaiveDate) -> Result<RawTimetable> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.timetable.lock().unwrap().clone())
    }
}

#[derive(Default)]
struct WorkspaceState {
    events: HashMap<String, Vec<CalendarEvent>>,
    tasks: HashMap<String, Vec<Task>>,
    task_lists: Vec<TaskList>,
    stored_ids: HashSet<String>,
    inserted: Vec<(String, ProposedEvent)>,
    always_fail: HashMap<String, PlanError>,
    transient_failures: HashMap<String, u32>,
    lost_acks: HashSet<String>,
    list_calls: Vec<String>,
}

/// In-memory calendar workspace.
///
/// Insertions are stored by event id; inserting an id that already exists
/// succeeds with that id, mirroring the calendar's conflict handling.
#[derive(Clone, Default)]
pub struct MockWorkspace {
    state: Arc<Mutex<WorkspaceState>>,
    insert_calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    auth_error: Option<PlanError>,
    insert_delay: Option<Duration>,
}

impl MockWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(self, calendar_id: &str, events: Vec<CalendarEvent>) -> Self {
        self.state.lock().unwrap().events.insert(calendar_id.to_string(), events);
        self
    }

    pub fn with_tasks(self, list_id: &str, tasks: Vec<Task>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.task_lists.push(TaskList { id: list_id.to_string(), title: list_id.to_string() });
            state.tasks.insert(list_id.to_string(), tasks);
        }
        self
    }

    /// Every insertion of `summary` fails with `error`.
    pub fn failing(self, summary: &str, error: PlanError) -> Self {
        self.state.lock().unwrap().always_fail.insert(summary.to_string(), error);
        self
    }

    /// The first `times` insertions of `summary` fail with a transport error.
    pub fn flaky(self, summary: &str, times: u32) -> Self {
        self.state.lock().unwrap().transient_failures.insert(summary.to_string(), times);
        self
    }

    /// The first insertion of `summary` is stored but its response is lost.
    pub fn losing_first_ack(self, summary: &str) -> Self {
        self.state.lock().unwrap().lost_acks.insert(summary.to_string());
        self
    }

    pub fn unauthenticated(mut self, error: PlanError) -> Self {
        self.auth_error = Some(error);
        self
    }

    pub fn with_insert_delay(mut self, delay: Duration) -> Self {
        self.insert_delay = Some(delay);
        self
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Distinct events stored per calendar, in insertion order.
    pub fn inserted(&self) -> Vec<(String, ProposedEvent)> {
        self.state.lock().unwrap().inserted.clone()
    }

    pub fn listed_calendars(&self) -> Vec<String> {
        self.state.lock().unwrap().list_calls.clone()
    }
}

#[async_trait]
impl CalendarWorkspace for MockWorkspace {
    async fn ensure_authenticated(&self) -> Result<()> {
        match &self.auth_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls.push(calendar_id.to_string());
        Ok(state
            .events
            .get(calendar_id)
            .map(|events| {
                events
                    .iter()
                    .filter(|e| e.start.instant() >= time_min && e.start.instant() < time_max)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_event(&self, calendar_id: &str, event: &ProposedEvent) -> Result<String> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.store(calendar_id, event);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn list_task_lists(&self) -> Result<Vec<TaskList>> {
        Ok(self.state.lock().unwrap().task_lists.clone())
    }

    async fn list_tasks(&self, list_id: &str, limit: u32) -> Result<Vec<Task>> {
        let state = self.state.lock().unwrap();
        let tasks = state.tasks.get(list_id).ok_or_else(|| PlanError::Api {
            status: 404,
            message: format!("task list {list_id} not found"),
        })?;
        Ok(tasks.iter().take(limit as usize).cloned().collect())
    }

    async fn insert_task(&self, list_id: &str, task: &NewTask) -> Result<Task> {
        let created = Task {
            title: task.title.clone(),
            notes: task.notes.clone(),
            due: task.due,
            status: task.status,
            completed: None,
        };
        self.state
            .lock()
            .unwrap()
            .tasks
            .entry(list_id.to_string())
            .or_default()
            .push(created.clone());
        Ok(created)
    }
}

impl MockWorkspace {
    fn store(&self, calendar_id: &str, event: &ProposedEvent) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        let id = event.id.clone().unwrap_or_else(|| format!("evt-{}", state.inserted.len()));

        if let Some(error) = state.always_fail.get(&event.summary) {
            return Err(error.clone());
        }
        if let Some(remaining) = state.transient_failures.get_mut(&event.summary) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(PlanError::transport("connection reset"));
            }
        }
        if state.stored_ids.contains(&id) {
            return Ok(id);
        }

        state.stored_ids.insert(id.clone());
        state.inserted.push((calendar_id.to_string(), event.clone()));
        if state.lost_acks.remove(&event.summary) {
            return Err(PlanError::transport("response lost"));
        }
        Ok(id)
    }
}

/// Planning service replying with a fixed text.
#[derive(Clone, Default)]
pub struct MockPlanningService {
    response: Arc<Mutex<String>>,
    contexts: Arc<Mutex<Vec<PlanningContext>>>,
    delay: Option<Duration>,
}

impl MockPlanningService {
    pub fn replying(response: impl Into<String>) -> Self {
        Self { response: Arc::new(Mutex::new(response.into())), ..Self::default() }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.contexts.lock().unwrap().len()
    }

    pub fn last_context(&self) -> Option<PlanningContext> {
        self.contexts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PlanningService for MockPlanningService {
    async fn submit(&self, context: &PlanningContext) -> Result<String> {
        self.contexts.lock().unwrap().push(context.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.response.lock().unwrap().clone())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Monday..Friday timetable; Monday has six periods ending 13:30.
pub fn school_timetable() -> RawTimetable {
    let hours = vec![
        hour("1", "7:55", "8:40"),
        hour("2", "8:50", "9:35"),
        hour("3", "9:55", "10:40"),
        hour("4", "10:50", "11:35"),
        hour("5", "11:50", "12:35"),
        hour("6", "12:45", "13:30"),
    ];
    let days = [(1, 6), (2, 5), (3, 4), (4, 6), (5, 0)]
        .into_iter()
        .map(|(day_of_week, periods)| RawDay {
            day_of_week,
            day_description: None,
            day_type: "WorkDay".into(),
            atoms: (0..periods).map(|i| json!({ "HourId": i })).collect(),
            date: None,
        })
        .collect();
    RawTimetable { hours, days }
}

fn hour(caption: &str, begin: &str, end: &str) -> RawHour {
    RawHour { id: None, caption: caption.into(), begin_time: begin.into(), end_time: end.into() }
}

pub fn calendar_event(summary: &str, start: &str) -> CalendarEvent {
    CalendarEvent {
        start: EventTime::from_parts(Some(start), None).unwrap(),
        end: None,
        summary: summary.into(),
        description: None,
        location: None,
    }
}

pub fn task(title: &str, notes: &str) -> Task {
    Task {
        title: title.into(),
        notes: Some(notes.into()),
        due: None,
        status: TaskStatus::NeedsAction,
        completed: None,
    }
}

pub fn proposed(summary: &str, start: &str, end: &str) -> ProposedEvent {
    ProposedEvent {
        id: None,
        summary: summary.into(),
        description: None,
        location: None,
        start: EventDateTime {
            date_time: DateTime::parse_from_rfc3339(start).unwrap(),
            time_zone: "Europe/Prague".into(),
        },
        end: EventDateTime {
            date_time: DateTime::parse_from_rfc3339(end).unwrap(),
            time_zone: "Europe/Prague".into(),
        },
        color_id: Some("5".into()),
    }
}

/// JSON array text for the given proposals, as the planning service sends it.
pub fn response_text(events: &[ProposedEvent]) -> String {
    serde_json::to_string(events).unwrap()
}
