//! Planning pipeline - orchestrates one planning run

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{info, instrument};
use weekplan_domain::{
    AppConfig, CalendarEvent, PlanError, PlanOutcome, PlanResponse, PlanningContext, Result,
};

use super::context::{end_of_week, PlanContextBuilder};
use super::parser::PlanResponseParser;
use super::ports::{CalendarWorkspace, PlanningService};
use super::readers::{CalendarWindowReader, TaskReader};
use super::writer::{CalendarWriter, RetryPolicy};
use crate::timetable::{TimetableNormalizer, TimetableSource};

/// Identifiers and limits for a planning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Calendar read for existing commitments
    pub calendar_id: String,
    /// Calendar the plan is written to and checked against
    pub ai_calendar_id: String,
    /// Task list fed into the context; `None` plans without tasks
    pub task_list_id: Option<String>,
    /// Most tasks read from the list
    pub task_limit: u32,
    /// Free-text preferences passed through to the planning service
    pub preferences: String,
    /// Most insertions in flight at once
    pub fan_out: usize,
    /// Retry schedule of a single insertion
    pub retry: RetryPolicy,
    /// Bound on the whole run
    pub run_timeout: Duration,
    /// Window of the AI-calendar check, starting now
    pub ai_lookahead: chrono::Duration,
}

impl PipelineSettings {
    /// Settings from a validated configuration
    pub fn from_config(config: &AppConfig) -> Self {
        let pipeline = &config.pipeline;
        let initial_delay = Duration::from_millis(pipeline.insert_backoff_ms);
        Self {
            calendar_id: config.google.calendar_id.clone(),
            ai_calendar_id: config.google.ai_calendar_id.clone(),
            task_list_id: config.google.task_list_id.clone(),
            task_limit: config.google.task_limit,
            preferences: config.preferences.clone(),
            fan_out: pipeline.fan_out_limit,
            retry: RetryPolicy {
                max_attempts: pipeline.max_insert_attempts,
                initial_delay,
                ..RetryPolicy::default()
            },
            run_timeout: Duration::from_secs(pipeline.run_timeout_secs),
            ai_lookahead: chrono::Duration::days(pipeline.ai_lookahead_days),
        }
    }
}

/// Runs the stages of a planning run in order
///
/// The AI-plan calendar is read first: any event in the lookahead window
/// ends the run as `AlreadyPlanned` before the timetable, the planning
/// service or the writer is touched. The whole run is bounded by the run
/// timeout; insertions already dispatched keep running if it fires.
pub struct PlanPipeline {
    timetable: Arc<dyn TimetableSource>,
    workspace: Arc<dyn CalendarWorkspace>,
    planner: Arc<dyn PlanningService>,
    settings: PipelineSettings,
}

impl PlanPipeline {
    /// Pipeline over the given ports
    pub fn new(
        timetable: Arc<dyn TimetableSource>,
        workspace: Arc<dyn CalendarWorkspace>,
        planner: Arc<dyn PlanningService>,
        settings: PipelineSettings,
    ) -> Self {
        Self { timetable, workspace, planner, settings }
    }

    /// Plan the rest of the week and commit it
    ///
    /// A commit with failed insertions still returns `Ok`; the report's
    /// `partial_error()` describes what failed.
    ///
    /// # Errors
    /// Configuration, authentication, lookup and parse failures, transport
    /// failures outside single insertions, and `PipelineTimeout`.
    #[instrument(skip_all, fields(today = %now.date_naive()))]
    pub async fn run(&self, now: DateTime<Tz>) -> Result<PlanOutcome> {
        self.with_timeout(async {
            match self.plan(now).await? {
                PlanResponse::AlreadyPlanned => Ok(PlanOutcome::AlreadyPlanned),
                PlanResponse::Proposed(events) => {
                    let writer = CalendarWriter::new(
                        Arc::clone(&self.workspace),
                        self.settings.ai_calendar_id.clone(),
                        self.settings.fan_out,
                        self.settings.retry,
                    );
                    Ok(PlanOutcome::Created(writer.commit(events).await?))
                }
            }
        })
        .await
    }

    /// Run every stage up to parsing without touching the AI-plan calendar
    ///
    /// # Errors
    /// Same as [`PlanPipeline::run`], minus commit failures.
    #[instrument(skip_all, fields(today = %now.date_naive()))]
    pub async fn propose(&self, now: DateTime<Tz>) -> Result<PlanResponse> {
        self.with_timeout(self.plan(now)).await
    }

    async fn with_timeout<T>(
        &self,
        stages: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        let limit = self.settings.run_timeout;
        tokio::time::timeout(limit, stages).await.map_err(|_| PlanError::PipelineTimeout(limit))?
    }

    async fn plan(&self, now: DateTime<Tz>) -> Result<PlanResponse> {
        let now_utc = now.with_timezone(&Utc);
        let reader = CalendarWindowReader::new(
            Arc::clone(&self.workspace),
            self.settings.ai_calendar_id.clone(),
            self.settings.ai_lookahead,
        );

        let ai_events = reader.read_ai_window(now_utc).await?;
        if !ai_events.is_empty() {
            info!(events = ai_events.len(), "AI calendar already holds a plan for this window");
            return Ok(PlanResponse::AlreadyPlanned);
        }

        let context = self.gather(&reader, ai_events, now).await?;
        let raw = self.planner.submit(&context).await?;
        let response = PlanResponseParser::parse(&raw)?;

        match &response {
            PlanResponse::AlreadyPlanned => {
                info!("Planning service reports the plan already exists");
            }
            PlanResponse::Proposed(events) => {
                info!(events = events.len(), "Planning service proposed events");
            }
        }
        Ok(response)
    }

    async fn gather(
        &self,
        reader: &CalendarWindowReader,
        ai_events: BTreeMap<String, CalendarEvent>,
        now: DateTime<Tz>,
    ) -> Result<PlanningContext> {
        let raw_timetable = self.timetable.fetch_timetable(now.date_naive()).await?;
        let days = TimetableNormalizer::normalize(&raw_timetable)?;

        let existing_events = reader
            .read_window(&self.settings.calendar_id, now.with_timezone(&Utc), end_of_week(now))
            .await?;

        let tasks = match self.settings.task_list_id.as_deref() {
            Some(list_id) => {
                TaskReader::new(Arc::clone(&self.workspace))
                    .read_tasks(list_id, self.settings.task_limit)
                    .await?
            }
            None => BTreeMap::new(),
        };

        info!(
            days = days.len(),
            events = existing_events.len(),
            tasks = tasks.len(),
            "Gathered planning inputs"
        );

        Ok(PlanContextBuilder::build(
            &days,
            existing_events,
            ai_events,
            tasks,
            &self.settings.preferences,
            now,
        ))
    }
}
