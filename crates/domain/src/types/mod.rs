//! Domain types and models
//!
//! Everything the pipeline passes between stages lives here: the normalized
//! timetable, calendar and task snapshots, the planning context sent to the
//! planning service, and the proposals and outcomes that come back.

pub mod calendar;
pub mod plan;
pub mod task;
pub mod timetable;

pub use calendar::{CalendarEvent, CalendarSummary, EventTime};
pub use plan::{
    CommitReport, EventDateTime, EventOutcome, InsertResult, PlanOutcome, PlanResponse,
    PlanningContext, ProposedEvent,
};
pub use task::{NewTask, Task, TaskList, TaskStatus};
pub use timetable::{DaySummary, DayType, RawDay, RawHour, RawTimetable, Subject, TeacherRef};
