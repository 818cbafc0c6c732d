//! `weekplan plan`

use std::process::ExitCode;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use weekplan_domain::{PlanOutcome, PlanResponse};

use super::print_json;
use crate::context::AppContext;

/// Exit code for a commit where some insertions failed
pub const PARTIAL_COMMIT_EXIT: u8 = 2;

/// Run the pipeline, or stop after parsing with `dry_run`
pub async fn run(ctx: &AppContext, dry_run: bool) -> anyhow::Result<ExitCode> {
    let pipeline = ctx.pipeline()?;
    let now = Utc::now().with_timezone(&ctx.config.pipeline.tz()?);

    if dry_run {
        let proposal = match pipeline.propose(now).await? {
            PlanResponse::AlreadyPlanned => json!({ "outcome": "already_planned" }),
            PlanResponse::Proposed(events) => json!({ "outcome": "proposed", "events": events }),
        };
        print_json(&proposal)?;
        return Ok(ExitCode::SUCCESS);
    }

    let outcome = pipeline.run(now).await?;
    print_json(&outcome)?;

    match &outcome {
        PlanOutcome::AlreadyPlanned => {
            info!("Plan already exists for this week, nothing written");
            Ok(ExitCode::SUCCESS)
        }
        PlanOutcome::Created(report) => match report.partial_error() {
            Some(err) => {
                warn!(error = %err, failed = ?report.failed(), "Plan committed with failures");
                Ok(ExitCode::from(PARTIAL_COMMIT_EXIT))
            }
            None => {
                info!(inserted = report.succeeded(), "Plan committed");
                Ok(ExitCode::SUCCESS)
            }
        },
    }
}
