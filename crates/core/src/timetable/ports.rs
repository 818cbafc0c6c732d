//! Port interfaces for the timetable source

use async_trait::async_trait;
use chrono::NaiveDate;
use weekplan_domain::{RawTimetable, Result};

/// Trait for fetching the raw weekly timetable
#[async_trait]
pub trait TimetableSource: Send + Sync {
    /// Fetch the timetable for the week containing `as_of`
    ///
    /// Sources serving only a permanent timetable may ignore the date.
    async fn fetch_timetable(&self, as_of: NaiveDate) -> Result<RawTimetable>;
}
