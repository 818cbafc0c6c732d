//! Calendar event snapshot types

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Start or end of a calendar event
///
/// Timed events carry an offset-aware timestamp; all-day events only a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    DateTime(DateTime<FixedOffset>),
    Date(NaiveDate),
}

impl EventTime {
    /// Builds an event time from the `dateTime` / `date` pair of a calendar
    /// payload, preferring the timestamp
    pub fn from_parts(date_time: Option<&str>, date: Option<&str>) -> Option<Self> {
        if let Some(raw) = date_time {
            return DateTime::parse_from_rfc3339(raw.trim()).ok().map(Self::DateTime);
        }
        date.and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()).map(Self::Date)
    }

    /// ISO string used as the map key of an event
    pub fn key(&self) -> String {
        match self {
            Self::DateTime(dt) => dt.to_rfc3339(),
            Self::Date(date) => date.format("%Y-%m-%d").to_string(),
        }
    }

    /// Instant used for ordering; all-day events sort at UTC midnight
    pub fn instant(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => dt.with_timezone(&Utc),
            Self::Date(date) => Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)),
        }
    }
}

/// Event read from a calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub start: EventTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl CalendarEvent {
    /// Map key of the event (its start timestamp)
    pub fn key(&self) -> String {
        self.start.key()
    }
}

/// Entry of the account's calendar list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSummary {
    pub id: String,
    pub summary: String,
    /// Set for the account's own calendar
    #[serde(default)]
    pub primary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_role: Option<String>,
}
