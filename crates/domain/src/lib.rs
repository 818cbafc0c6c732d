//! # Weekplan Domain
//!
//! Domain types and models for the weekly planner.
//!
//! This crate contains:
//! - Timetable, calendar, task and plan data types
//! - The `PlanError` taxonomy and `Result` alias
//! - Configuration structures and their validation
//! - Shared constants and the label-conversion macro
//!
//! ## Architecture
//! - No dependencies on other weekplan crates
//! - No I/O; pure data structures and validation

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

pub use config::*;
pub use errors::*;
pub use types::*;
