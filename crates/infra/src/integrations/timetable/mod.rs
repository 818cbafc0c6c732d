//! School timetable service integration
//!
//! Password-grant login, the permanent and actual weekly timetable, and the
//! subject map. [`TimetableClient`] implements the core `TimetableSource`
//! port for the configured timetable mode.

mod client;
mod types;

pub use client::TimetableClient;
