//! # Weekplan Core
//!
//! Pure planning logic - no HTTP, no process concerns.
//!
//! This crate contains:
//! - Port interfaces for the timetable, calendar workspace and planning
//!   service
//! - Timetable normalization, context building and response parsing
//! - The bounded concurrent calendar writer and the pipeline that runs it
//!
//! ## Architecture Principles
//! - Only depends on `weekplan-domain`
//! - All external systems via traits
//! - Pure, testable business logic

pub mod planning;
pub mod timetable;

pub use planning::{
    CalendarWindowReader, CalendarWorkspace, CalendarWriter, PipelineSettings, PlanContextBuilder,
    PlanPipeline, PlanResponseParser, PlanningService, RetryPolicy, TaskReader,
};
pub use timetable::{TimetableNormalizer, TimetableSource};
