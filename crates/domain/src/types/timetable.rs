//! Timetable wire records and their normalized per-day summary

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::impl_label_conversions;

/// Raw weekly timetable as served by the school information system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawTimetable {
    #[serde(default)]
    pub hours: Vec<RawHour>,
    #[serde(default)]
    pub days: Vec<RawDay>,
}

impl RawTimetable {
    /// Period-count label to period record
    pub fn hours_by_caption(&self) -> HashMap<&str, &RawHour> {
        self.hours.iter().map(|hour| (hour.caption.trim(), hour)).collect()
    }
}

/// One teaching period of the bell schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawHour {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub caption: String,
    pub begin_time: String,
    pub end_time: String,
}

/// One weekday of the raw timetable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawDay {
    /// 1 = Monday .. 7 = Sunday
    pub day_of_week: u8,
    #[serde(default)]
    pub day_description: Option<String>,
    #[serde(default)]
    pub day_type: String,
    #[serde(default)]
    pub atoms: Vec<serde_json::Value>,
    #[serde(default)]
    pub date: Option<String>,
}

impl RawDay {
    /// Weekday for the numeric `DayOfWeek` field
    pub fn weekday(&self) -> Option<Weekday> {
        match self.day_of_week {
            1 => Some(Weekday::Mon),
            2 => Some(Weekday::Tue),
            3 => Some(Weekday::Wed),
            4 => Some(Weekday::Thu),
            5 => Some(Weekday::Fri),
            6 => Some(Weekday::Sat),
            7 => Some(Weekday::Sun),
            _ => None,
        }
    }

    /// Calendar date, if the timetable carries one
    ///
    /// Accepts both a bare date and a full timestamp such as
    /// `2025-09-01T00:00:00+02:00`; only the date part is kept.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?.trim();
        let date_part = raw.get(..10)?;
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
    }
}

/// Kind of school day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    Regular,
    Holiday,
    Other,
}

impl_label_conversions!(DayType {
    Regular => "regular",
    Holiday => "holiday",
    Other => "other",
});

impl DayType {
    /// Maps the timetable's own day type label
    ///
    /// `WorkDay` is a regular school day; `Holiday` and `Celebration` are
    /// days off. Anything else (weekend, directors' day, unknown) is `Other`.
    pub fn from_timetable_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "workday" | "regular" => Self::Regular,
            "holiday" | "celebration" => Self::Holiday,
            _ => Self::Other,
        }
    }
}

/// Normalized view of one weekday
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub day_of_week: Weekday,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub description: String,
    pub day_type: DayType,
    #[serde(with = "hour_minute")]
    pub ending_time: NaiveTime,
}

impl DaySummary {
    /// True when no periods are scheduled on this day
    pub fn is_free(&self) -> bool {
        self.ending_time == NaiveTime::MIN
    }
}

/// Subject taught at the school, keyed by subject id in the subject map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    pub teacher: TeacherRef,
}

/// Teacher of a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherRef {
    pub name: String,
    pub id: String,
}

/// `HH:MM` serialization for times of day
pub mod hour_minute {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(serde::de::Error::custom)
    }
}
