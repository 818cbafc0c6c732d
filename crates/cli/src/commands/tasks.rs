//! `weekplan calendars`, `weekplan task-lists` and `weekplan add-task`

use std::process::ExitCode;

use anyhow::{anyhow, Context as _};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use weekplan_core::CalendarWorkspace;
use weekplan_domain::NewTask;

use super::print_json;
use crate::context::AppContext;

/// Arguments of `add-task`
#[derive(Debug, clap::Args)]
pub struct AddTaskArgs {
    /// Task title
    pub title: String,
    /// Free-text notes
    #[arg(long)]
    pub notes: Option<String>,
    /// Due date (`YYYY-MM-DD` or an RFC 3339 timestamp)
    #[arg(long, value_parser = parse_due)]
    pub due: Option<DateTime<Utc>>,
    /// Task list id; defaults to the configured task list
    #[arg(long)]
    pub list: Option<String>,
}

pub async fn list_calendars(ctx: &AppContext) -> anyhow::Result<ExitCode> {
    let workspace = ctx.workspace()?;
    print_json(&workspace.list_calendars().await?)?;
    Ok(ExitCode::SUCCESS)
}

pub async fn list_task_lists(ctx: &AppContext) -> anyhow::Result<ExitCode> {
    let workspace = ctx.workspace()?;
    workspace.ensure_authenticated().await?;
    print_json(&workspace.list_task_lists().await?)?;
    Ok(ExitCode::SUCCESS)
}

pub async fn add_task(ctx: &AppContext, args: AddTaskArgs) -> anyhow::Result<ExitCode> {
    let list_id = args
        .list
        .or_else(|| ctx.config.google.task_list_id.clone())
        .ok_or_else(|| anyhow!("no task list given; pass --list or set WEEKPLAN_TASK_LIST_ID"))?;

    let mut task = NewTask::new(args.title);
    task.notes = args.notes;
    task.due = args.due;

    let workspace = ctx.workspace()?;
    let created = workspace
        .insert_task(&list_id, &task)
        .await
        .with_context(|| format!("failed to add task to {list_id}"))?;
    print_json(&created)?;
    Ok(ExitCode::SUCCESS)
}

fn parse_due(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected YYYY-MM-DD or RFC 3339 timestamp: {e}"))
}
