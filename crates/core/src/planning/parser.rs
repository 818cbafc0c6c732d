//! Planning service response parsing

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use weekplan_domain::constants::ALREADY_PLANNED_SENTINEL;
use weekplan_domain::{EventDateTime, PlanError, PlanResponse, ProposedEvent, Result};

/// Turns the raw planning service answer into validated proposals
///
/// Parsing is all or nothing: one malformed element rejects the whole
/// response, so a run never commits half a plan.
pub struct PlanResponseParser;

impl PlanResponseParser {
    /// Parse the raw response text
    ///
    /// The exact sentinel (after trimming, case-sensitive) means the week is
    /// already planned. Anything else must be a bare JSON array of events.
    ///
    /// # Errors
    /// Returns `PlanError::Parse` carrying the raw text and, when the
    /// failure is element-specific, the element index.
    pub fn parse(raw: &str) -> Result<PlanResponse> {
        let trimmed = raw.trim();
        if trimmed == ALREADY_PLANNED_SENTINEL {
            return Ok(PlanResponse::AlreadyPlanned);
        }

        let fail = |index: Option<usize>, reason: String| PlanError::Parse {
            index,
            reason,
            raw: raw.to_string(),
        };

        let value: Value =
            serde_json::from_str(trimmed).map_err(|e| fail(None, format!("invalid JSON: {e}")))?;
        let Value::Array(elements) = value else {
            return Err(fail(None, "expected a JSON array of events".to_string()));
        };

        let events = elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                parse_event(element).map_err(|reason| fail(Some(index), reason))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(PlanResponse::Proposed(events))
    }
}

fn parse_event(element: &Value) -> std::result::Result<ProposedEvent, String> {
    let object = element.as_object().ok_or("element is not an object")?;

    let summary = optional_text(object, "summary")?
        .filter(|s| !s.trim().is_empty())
        .ok_or("summary is missing or empty")?;
    let start = parse_boundary(object, "start")?;
    let end = parse_boundary(object, "end")?;
    if end.date_time <= start.date_time {
        return Err(format!(
            "end {} is not after start {}",
            end.date_time.to_rfc3339(),
            start.date_time.to_rfc3339()
        ));
    }

    let color_id = match object.get("colorId") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(_) => return Err("colorId must be a string".to_string()),
    };

    Ok(ProposedEvent {
        id: None,
        summary,
        description: optional_text(object, "description")?,
        location: optional_text(object, "location")?,
        start,
        end,
        color_id,
    })
}

fn parse_boundary(
    object: &Map<String, Value>,
    field: &str,
) -> std::result::Result<EventDateTime, String> {
    let boundary = object
        .get(field)
        .and_then(Value::as_object)
        .ok_or_else(|| format!("{field} is missing or not an object"))?;

    let raw_date_time = boundary
        .get("dateTime")
        .and_then(Value::as_str)
        .ok_or_else(|| format!("{field}.dateTime is missing"))?;
    let date_time: DateTime<FixedOffset> = DateTime::parse_from_rfc3339(raw_date_time.trim())
        .map_err(|e| format!("{field}.dateTime '{raw_date_time}' is malformed: {e}"))?;

    let time_zone = boundary
        .get("timeZone")
        .and_then(Value::as_str)
        .filter(|tz| !tz.trim().is_empty())
        .ok_or_else(|| format!("{field}.timeZone is missing"))?;

    Ok(EventDateTime { date_time, time_zone: time_zone.to_string() })
}

fn optional_text(
    object: &Map<String, Value>,
    field: &str,
) -> std::result::Result<Option<String>, String> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(format!("{field} must be a string")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(summary: &str, start: &str, end: &str) -> String {
        format!(
            r#"{{"summary":"{summary}","location":"Gym","start":{{"dateTime":"{start}","timeZone":"Europe/Prague"}},"end":{{"dateTime":"{end}","timeZone":"Europe/Prague"}},"colorId":"5"}}"#
        )
    }

    fn proposed(raw: &str) -> Vec<ProposedEvent> {
        match PlanResponseParser::parse(raw).unwrap() {
            PlanResponse::Proposed(events) => events,
            PlanResponse::AlreadyPlanned => panic!("expected proposals"),
        }
    }

    #[test]
    fn recognizes_sentinel_after_trimming() {
        assert_eq!(
            PlanResponseParser::parse("  plan already created\n").unwrap(),
            PlanResponse::AlreadyPlanned
        );
    }

    #[test]
    fn sentinel_is_case_sensitive() {
        let err = PlanResponseParser::parse("Plan already created").unwrap_err();
        assert!(matches!(err, PlanError::Parse { index: None, .. }));
    }

    #[test]
    fn parses_elements_in_order() {
        let raw = format!(
            "[{},{},{}]",
            element("Homework", "2025-07-16T15:00:00+02:00", "2025-07-16T16:00:00+02:00"),
            element("Judo", "2025-07-16T17:10:00+02:00", "2025-07-16T18:40:00+02:00"),
            element("Relax", "2025-07-16T19:00:00+02:00", "2025-07-16T20:00:00+02:00"),
        );

        let events = proposed(&raw);

        let summaries: Vec<&str> = events.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(summaries, vec!["Homework", "Judo", "Relax"]);
        assert_eq!(events[1].color_id.as_deref(), Some("5"));
        assert_eq!(events[1].location.as_deref(), Some("Gym"));
        assert_eq!(events[1].id, None);
    }

    #[test]
    fn empty_array_is_an_empty_plan() {
        assert!(proposed("[]").is_empty());
    }

    #[test]
    fn one_bad_element_fails_the_whole_parse() {
        let raw = format!(
            "[{},{}]",
            element("Homework", "2025-07-16T15:00:00+02:00", "2025-07-16T16:00:00+02:00"),
            element("Backwards", "2025-07-16T18:00:00+02:00", "2025-07-16T17:00:00+02:00"),
        );

        let err = PlanResponseParser::parse(&raw).unwrap_err();

        match err {
            PlanError::Parse { index, reason, raw: kept } => {
                assert_eq!(index, Some(1));
                assert!(reason.contains("not after start"));
                assert_eq!(kept, raw);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_summary() {
        let raw = element("", "2025-07-16T15:00:00+02:00", "2025-07-16T16:00:00+02:00");
        let err = PlanResponseParser::parse(&format!("[{raw}]")).unwrap_err();
        assert!(matches!(err, PlanError::Parse { index: Some(0), .. }));
    }

    #[test]
    fn rejects_malformed_date_time() {
        let raw = element("Study", "tomorrow at five", "2025-07-16T16:00:00+02:00");
        let err = PlanResponseParser::parse(&format!("[{raw}]")).unwrap_err();
        assert!(err.to_string().contains("start.dateTime"));
    }

    #[test]
    fn rejects_missing_time_zone() {
        let raw = concat!(
            r#"[{"summary":"Study","start":{"dateTime":"2025-07-16T15:00:00+02:00"},"#,
            r#""end":{"dateTime":"2025-07-16T16:00:00+02:00","timeZone":"Europe/Prague"}}]"#,
        );
        let err = PlanResponseParser::parse(raw).unwrap_err();
        assert!(err.to_string().contains("start.timeZone"));
    }

    #[test]
    fn rejects_code_fences_and_prose() {
        let fenced = "```json\n[]\n```";
        assert!(matches!(
            PlanResponseParser::parse(fenced),
            Err(PlanError::Parse { index: None, .. })
        ));
        assert!(PlanResponseParser::parse("Here you go: []").is_err());
    }

    #[test]
    fn rejects_non_array_json() {
        let err = PlanResponseParser::parse(r#"{"events":[]}"#).unwrap_err();
        assert!(err.to_string().contains("expected a JSON array"));
    }
}
