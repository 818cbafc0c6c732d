//! Raw timetable to per-weekday summaries

use std::collections::HashMap;

use chrono::NaiveTime;
use weekplan_domain::{DaySummary, DayType, PlanError, RawDay, RawHour, RawTimetable, Result};

/// Collapses the raw timetable into one `DaySummary` per weekday
///
/// A day's ending time is the end of the period whose caption equals the
/// number of periods scheduled that day. Days without periods end at
/// midnight.
pub struct TimetableNormalizer;

impl TimetableNormalizer {
    /// Normalize every day, Monday first
    ///
    /// # Errors
    /// - `PlanError::Lookup` when a period count has no matching entry in
    ///   the bell schedule
    /// - `PlanError::InvalidInput` for an out-of-range weekday or a malformed
    ///   period end time
    pub fn normalize(raw: &RawTimetable) -> Result<Vec<DaySummary>> {
        let hours = raw.hours_by_caption();
        let mut days = raw
            .days
            .iter()
            .map(|day| Self::summarize(day, &hours))
            .collect::<Result<Vec<_>>>()?;
        days.sort_by_key(|day| day.day_of_week.num_days_from_monday());
        Ok(days)
    }

    fn summarize(day: &RawDay, hours: &HashMap<&str, &RawHour>) -> Result<DaySummary> {
        let day_of_week = day.weekday().ok_or_else(|| {
            PlanError::invalid_input(format!("DayOfWeek out of range: {}", day.day_of_week))
        })?;

        let period_count = day.atoms.len();
        let ending_time = if period_count == 0 {
            NaiveTime::MIN
        } else {
            let hour = hours.get(period_count.to_string().as_str()).ok_or_else(|| {
                PlanError::Lookup { count: period_count, day: day_of_week.to_string() }
            })?;
            parse_clock(&hour.end_time)?
        };

        Ok(DaySummary {
            day_of_week,
            date: day.calendar_date(),
            description: day.day_description.clone().unwrap_or_default(),
            day_type: DayType::from_timetable_label(&day.day_type),
            ending_time,
        })
    }
}

/// Parses `H:MM` / `HH:MM` clock labels from the bell schedule
fn parse_clock(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|e| PlanError::invalid_input(format!("Invalid period end time '{raw}': {e}")))
}
