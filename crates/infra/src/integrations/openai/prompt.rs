//! Planning prompt assembly

use serde::Serialize;
use weekplan_domain::constants::ALREADY_PLANNED_SENTINEL;
use weekplan_domain::{PlanError, PlanningContext, Result};

/// Render the planning request for one context
///
/// The prompt carries every piece of the context as compact JSON plus the
/// output contract the response parser enforces: a bare JSON array of
/// calendar insertion bodies, or the sentinel text when the AI calendar
/// already holds a plan.
///
/// # Errors
/// Returns `PlanError::Internal` if a context section cannot be serialized.
pub fn build_prompt(context: &PlanningContext) -> Result<String> {
    let days = to_json(&context.days, "timetable")?;
    let events = to_json(&context.existing_events, "calendar events")?;
    let tasks = to_json(&context.tasks, "tasks")?;
    let ai_events = to_json(&context.existing_ai_events, "AI calendar events")?;
    let today_name = context.today.format("%A");
    let date = context.today_date;
    let today = context.today;
    let tz = &context.time_zone;
    let preferences = match context.preferences.trim() {
        "" => String::new(),
        text => format!("Be aware of my hobbies and preferences: {text}\n"),
    };

    Ok(format!(
        "Create a weekly plan for the following school timetable: {days}.\n\
         Take these existing calendar events into account: {events}.\n\
         {preferences}\
         Also consider my tasks: {tasks}. Ignore any task whose title alone does not tell you \
         what to plan.\n\
         Today is {today_name} and the date is {date} ({today}). Plan only from today through \
         Sunday of this week.\n\
         Include the calendar events in the plan and order each day by time, so an activity \
         never overlaps a fixed event and activities after an event start after it ends.\n\
         Keep the plan light with some free time to relax now and then, so the calendar does \
         not get overfilled.\n\
         Answer with a JSON array of event objects in exactly this shape: \
         {{\"summary\": string, \"description\": string (optional), \
         \"location\": string (optional), \
         \"start\": {{\"dateTime\": RFC 3339 timestamp with offset, \"timeZone\": \"{tz}\"}}, \
         \"end\": {{\"dateTime\": RFC 3339 timestamp with offset, \"timeZone\": \"{tz}\"}}, \
         \"colorId\": string (optional)}}.\n\
         Output only the JSON array. No introduction, no explanation and no ```json or ``` \
         fences.\n\
         If the plan is already created: {ai_events}, return just \
         '{ALREADY_PLANNED_SENTINEL}' and do not create the plan again."
    ))
}

fn to_json<T: Serialize + ?Sized>(value: &T, section: &str) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| PlanError::internal(format!("failed to serialize {section}: {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{NaiveDate, NaiveTime, Weekday};
    use weekplan_domain::{CalendarEvent, DayType, DaySummary, EventTime, Task, TaskStatus};

    use super::*;

    fn context() -> PlanningContext {
        let event = CalendarEvent {
            start: EventTime::from_parts(Some("2025-07-16T10:00:00+02:00"), None).unwrap(),
            end: EventTime::from_parts(Some("2025-07-16T11:00:00+02:00"), None),
            summary: "Dentist".into(),
            description: None,
            location: Some("Clinic".into()),
        };
        let mut tasks = BTreeMap::new();
        tasks.insert(
            "Essay".to_string(),
            Task {
                title: "Essay".into(),
                notes: None,
                due: None,
                status: TaskStatus::NeedsAction,
                completed: None,
            },
        );
        PlanningContext {
            days: vec![DaySummary {
                day_of_week: Weekday::Wed,
                date: NaiveDate::from_ymd_opt(2025, 7, 16),
                description: String::new(),
                day_type: DayType::Regular,
                ending_time: NaiveTime::from_hms_opt(13, 30, 0).unwrap(),
            }],
            existing_events: vec![event],
            existing_ai_events: BTreeMap::new(),
            tasks,
            preferences: "Judo on Tuesday at 16:00".into(),
            today_name: Weekday::Wed,
            today_date: 16,
            today: NaiveDate::from_ymd_opt(2025, 7, 16).unwrap(),
            time_zone: "Europe/Prague".into(),
        }
    }

    #[test]
    fn carries_every_context_section() {
        let prompt = build_prompt(&context()).unwrap();

        assert!(prompt.contains(r#""endingTime":"13:30""#));
        assert!(prompt.contains("Dentist"));
        assert!(prompt.contains(r#""Essay""#));
        assert!(prompt.contains("Judo on Tuesday at 16:00"));
        assert!(prompt.contains("Today is Wednesday and the date is 16"));
        assert!(prompt.contains("through Sunday"));
    }

    #[test]
    fn states_the_output_contract() {
        let prompt = build_prompt(&context()).unwrap();

        assert!(prompt.contains(r#""timeZone": "Europe/Prague""#));
        assert!(prompt.contains("no ```json"));
        assert!(prompt
            .ends_with("return just 'plan already created' and do not create the plan again."));
        assert!(prompt.contains("If the plan is already created: {}"));
    }

    #[test]
    fn omits_empty_preferences() {
        let mut context = context();
        context.preferences = "  ".into();
        assert!(!build_prompt(&context).unwrap().contains("hobbies"));
    }

    #[test]
    fn puts_each_instruction_on_its_own_line() {
        let prompt = build_prompt(&context()).unwrap();
        let lines: Vec<&str> = prompt.lines().collect();

        assert_eq!(lines.len(), 10);
        assert!(lines[2].starts_with("Be aware of my hobbies"));
        assert!(lines[9].starts_with("If the plan is already created"));
    }
}
