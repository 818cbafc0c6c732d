//! Planning context assembly

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use weekplan_domain::{CalendarEvent, DaySummary, DayType, PlanningContext, Task};

/// Merges normalized inputs into the context sent to the planning service
pub struct PlanContextBuilder;

impl PlanContextBuilder {
    /// Build the context for `now`
    ///
    /// `days` is the Monday-first timetable summary; only today through
    /// Sunday are kept. Weekdays the timetable does not cover (usually the
    /// weekend) are filled in as free days so the visible slice always runs
    /// to Sunday. Every kept day gets its calendar date.
    pub fn build(
        days: &[DaySummary],
        existing_events: Vec<CalendarEvent>,
        existing_ai_events: BTreeMap<String, CalendarEvent>,
        tasks: BTreeMap<String, Task>,
        preferences: &str,
        now: DateTime<Tz>,
    ) -> PlanningContext {
        let today = now.date_naive();
        let today_name = today.weekday();

        let remaining = remaining_weekdays(today_name)
            .map(|weekday| {
                let date = date_in_week(today, weekday);
                days.iter().find(|day| day.day_of_week == weekday).map_or_else(
                    || free_day(weekday, date),
                    |day| DaySummary { date: Some(day.date.unwrap_or(date)), ..day.clone() },
                )
            })
            .collect();

        PlanningContext {
            days: remaining,
            existing_events,
            existing_ai_events,
            tasks,
            preferences: preferences.to_string(),
            today_name,
            today_date: today.day(),
            today,
            time_zone: now.timezone().name().to_string(),
        }
    }
}

/// First instant after the Sunday of `now`'s week, in `now`'s zone
pub fn end_of_week(now: DateTime<Tz>) -> DateTime<Utc> {
    let today = now.date_naive();
    let days_left = i64::from(6 - today.weekday().num_days_from_monday());
    let next_monday = (today + Duration::days(days_left + 1)).and_time(NaiveTime::MIN);
    now.timezone()
        .from_local_datetime(&next_monday)
        .earliest()
        .map_or_else(|| Utc.from_utc_datetime(&next_monday), |local| local.with_timezone(&Utc))
}

fn remaining_weekdays(today: Weekday) -> impl Iterator<Item = Weekday> {
    let start = today.num_days_from_monday();
    (start..7).filter_map(weekday_from_index)
}

fn weekday_from_index(index: u32) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

fn date_in_week(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let offset = i64::from(weekday.num_days_from_monday())
        - i64::from(today.weekday().num_days_from_monday());
    today + Duration::days(offset)
}

fn free_day(weekday: Weekday, date: NaiveDate) -> DaySummary {
    DaySummary {
        day_of_week: weekday,
        date: Some(date),
        description: String::new(),
        day_type: DayType::Other,
        ending_time: NaiveTime::MIN,
    }
}
