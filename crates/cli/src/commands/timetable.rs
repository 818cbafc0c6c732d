//! `weekplan timetable` and `weekplan subjects`

use std::process::ExitCode;

use chrono::Utc;
use weekplan_core::{TimetableNormalizer, TimetableSource};

use super::print_json;
use crate::context::AppContext;

/// Print the normalized week of the configured timetable mode
pub async fn show(ctx: &AppContext) -> anyhow::Result<ExitCode> {
    let client = ctx.timetable()?;
    let today = Utc::now().with_timezone(&ctx.config.pipeline.tz()?).date_naive();

    let raw = client.fetch_timetable(today).await?;
    let days = TimetableNormalizer::normalize(&raw)?;
    print_json(&days)?;
    Ok(ExitCode::SUCCESS)
}

/// Print the subject id → subject map
pub async fn subjects(ctx: &AppContext) -> anyhow::Result<ExitCode> {
    let subjects = ctx.timetable()?.subjects().await?;
    print_json(&subjects)?;
    Ok(ExitCode::SUCCESS)
}
