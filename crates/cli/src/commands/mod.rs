//! Subcommand implementations
//!
//! Every command prints its result to stdout as pretty JSON and reports
//! the process exit code it wants.

pub mod plan;
pub mod tasks;
pub mod timetable;

use std::io::Write;

use serde::Serialize;

/// Write `value` to stdout as pretty JSON followed by a newline
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
