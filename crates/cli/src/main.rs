//! `weekplan` - weekly plan aggregation and calendar reconciliation
//!
//! Run once per invocation (by hand or from a scheduler). Command output
//! goes to stdout as JSON; logs go to stderr.
//!
//! Exit codes: 0 on success or when the week is already planned, 2 when a
//! plan was committed with failed insertions, 1 on any fatal error.

#![allow(clippy::print_stderr)]

mod commands;
mod context;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, error};

use commands::tasks::AddTaskArgs;
use context::AppContext;

#[derive(Parser)]
#[command(
    name = "weekplan",
    version,
    about = "Plan the rest of the week into a dedicated calendar"
)]
struct Cli {
    /// Config file (TOML or JSON); without it the environment is tried first
    #[arg(long, global = true, env = "WEEKPLAN_CONFIG")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the plan for today through Sunday and write it to the AI calendar
    Plan {
        /// Print the parsed proposal instead of writing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the normalized timetable of the current week
    Timetable,
    /// Print the subject map of the timetable service
    Subjects,
    /// List the calendars visible to the account with their ids
    Calendars,
    /// List the account's task lists
    TaskLists,
    /// Add a task to a task list
    AddTask(AddTaskArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let json_logs = cli.log_json
        || std::env::var("WEEKPLAN_LOG_FORMAT")
            .is_ok_and(|format| format.eq_ignore_ascii_case("json"));
    logging::init(json_logs);
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env file loaded"),
    }

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %format!("{err:#}"), "weekplan failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = weekplan_infra::config::load(cli.config)?;
    let ctx = AppContext::new(config)?;

    match cli.command {
        Command::Plan { dry_run } => commands::plan::run(&ctx, dry_run).await,
        Command::Timetable => commands::timetable::show(&ctx).await,
        Command::Subjects => commands::timetable::subjects(&ctx).await,
        Command::Calendars => commands::tasks::list_calendars(&ctx).await,
        Command::TaskLists => commands::tasks::list_task_lists(&ctx).await,
        Command::AddTask(args) => commands::tasks::add_task(&ctx, args).await,
    }
}
