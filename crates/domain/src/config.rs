//! Configuration management
//!
//! Credentials are explicit configuration: loaded once at startup, validated
//! before any network call and passed into each component at construction.

use std::fmt;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AI_LOOKAHEAD_DAYS, DEFAULT_FAN_OUT_LIMIT, DEFAULT_INSERT_BACKOFF_MS,
    DEFAULT_MAX_INSERT_ATTEMPTS, DEFAULT_PLANNER_MODEL, DEFAULT_PLANNER_URL,
    DEFAULT_RUN_TIMEOUT_SECS, DEFAULT_TASK_LIMIT, DEFAULT_TIME_ZONE, GOOGLE_CALENDAR_API_BASE,
    GOOGLE_TASKS_API_BASE, GOOGLE_TOKEN_URI, PRIMARY_CALENDAR_ID,
};
use crate::errors::{PlanError, Result};
use crate::impl_label_conversions;

/// Credential value that never shows up in `Debug` output or serialized config
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub timetable: TimetableConfig,
    pub google: GoogleConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Free-text user preferences forwarded to the planning service
    #[serde(default)]
    pub preferences: String,
}

/// Which timetable variant to read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimetableMode {
    /// Timetable for the current week, including substitutions
    #[default]
    Actual,
    /// Long-term timetable without one-off changes
    Permanent,
}

impl_label_conversions!(TimetableMode {
    Actual => "actual",
    Permanent => "permanent",
});

/// School timetable service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableConfig {
    pub base_url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<Secret>,
    #[serde(default)]
    pub mode: TimetableMode,
}

/// Google Calendar and Tasks configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// Calendar read for existing commitments
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    /// Dedicated calendar the plan is written to
    pub ai_calendar_id: String,
    #[serde(default)]
    pub task_list_id: Option<String>,
    #[serde(default = "default_task_limit")]
    pub task_limit: u32,
    #[serde(default, skip_serializing)]
    pub access_token: Option<Secret>,
    /// Service account identity, used with `private_key`
    #[serde(default)]
    pub client_email: Option<String>,
    /// PEM private key of the service account
    #[serde(default, skip_serializing)]
    pub private_key: Option<Secret>,
    #[serde(default, skip_serializing)]
    pub refresh_token: Option<Secret>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub client_secret: Option<Secret>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default = "default_calendar_api_base")]
    pub calendar_api_base: String,
    #[serde(default = "default_tasks_api_base")]
    pub tasks_api_base: String,
}

/// Planning service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default, skip_serializing)]
    pub api_key: Option<Secret>,
    #[serde(default = "default_planner_model")]
    pub model: String,
    #[serde(default = "default_planner_url")]
    pub api_url: String,
}

/// Run-level tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub fan_out_limit: usize,
    pub max_insert_attempts: u32,
    pub insert_backoff_ms: u64,
    pub run_timeout_secs: u64,
    pub ai_lookahead_days: i64,
    pub time_zone: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { api_key: None, model: default_planner_model(), api_url: default_planner_url() }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fan_out_limit: DEFAULT_FAN_OUT_LIMIT,
            max_insert_attempts: DEFAULT_MAX_INSERT_ATTEMPTS,
            insert_backoff_ms: DEFAULT_INSERT_BACKOFF_MS,
            run_timeout_secs: DEFAULT_RUN_TIMEOUT_SECS,
            ai_lookahead_days: DEFAULT_AI_LOOKAHEAD_DAYS,
            time_zone: DEFAULT_TIME_ZONE.to_string(),
        }
    }
}

impl GoogleConfig {
    /// Config with default endpoints for the given calendars
    pub fn new(calendar_id: impl Into<String>, ai_calendar_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            ai_calendar_id: ai_calendar_id.into(),
            task_list_id: None,
            task_limit: DEFAULT_TASK_LIMIT,
            access_token: None,
            client_email: None,
            private_key: None,
            refresh_token: None,
            client_id: None,
            client_secret: None,
            token_uri: default_token_uri(),
            calendar_api_base: default_calendar_api_base(),
            tasks_api_base: default_tasks_api_base(),
        }
    }

    /// Checks calendar identifiers and that some credential is present
    ///
    /// # Errors
    /// Returns `PlanError::Config` naming the first missing setting.
    pub fn validate(&self) -> Result<()> {
        if self.calendar_id.trim().is_empty() {
            return Err(PlanError::config("google.calendar_id must not be empty"));
        }
        if self.ai_calendar_id.trim().is_empty() {
            return Err(PlanError::config("google.ai_calendar_id is required"));
        }
        let has_access_token = self.access_token.as_ref().is_some_and(|t| !t.is_empty());
        let has_service_account =
            self.client_email.as_deref().is_some_and(|email| !email.trim().is_empty())
                && self.private_key.as_ref().is_some_and(|key| !key.is_empty());
        let has_refresh_grant = self.refresh_token.as_ref().is_some_and(|t| !t.is_empty())
            && self.client_id.as_deref().is_some_and(|id| !id.trim().is_empty());
        if !has_access_token && !has_service_account && !has_refresh_grant {
            return Err(PlanError::config(
                "google credentials missing: set an access token, a service account \
                 (client email and private key) or a refresh token with client id",
            ));
        }
        Ok(())
    }
}

impl TimetableConfig {
    /// # Errors
    /// Returns `PlanError::Config` when the base URL or login is missing.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(PlanError::config("timetable.base_url is required"));
        }
        if self.username.as_deref().map_or(true, |u| u.trim().is_empty()) {
            return Err(PlanError::config("timetable.username is required"));
        }
        if self.password.as_ref().map_or(true, Secret::is_empty) {
            return Err(PlanError::config("timetable.password is required"));
        }
        Ok(())
    }
}

impl PlannerConfig {
    /// # Errors
    /// Returns `PlanError::Config` when the API key or model is missing.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.as_ref().map_or(true, Secret::is_empty) {
            return Err(PlanError::config("planner.api_key is required"));
        }
        if self.model.trim().is_empty() {
            return Err(PlanError::config("planner.model must not be empty"));
        }
        Ok(())
    }
}

impl PipelineConfig {
    /// # Errors
    /// Returns `PlanError::Config` for zero limits or an unknown time zone.
    pub fn validate(&self) -> Result<()> {
        if self.fan_out_limit == 0 {
            return Err(PlanError::config("pipeline.fan_out_limit must be at least 1"));
        }
        if self.max_insert_attempts == 0 {
            return Err(PlanError::config("pipeline.max_insert_attempts must be at least 1"));
        }
        if self.run_timeout_secs == 0 {
            return Err(PlanError::config("pipeline.run_timeout_secs must be at least 1"));
        }
        if self.ai_lookahead_days <= 0 {
            return Err(PlanError::config("pipeline.ai_lookahead_days must be positive"));
        }
        self.tz().map(|_| ())
    }

    /// Parsed IANA time zone
    ///
    /// # Errors
    /// Returns `PlanError::Config` if the zone name is unknown.
    pub fn tz(&self) -> Result<Tz> {
        Tz::from_str(self.time_zone.trim())
            .map_err(|_| PlanError::config(format!("Unknown time zone: {}", self.time_zone)))
    }
}

impl AppConfig {
    /// Validates every section needed for a full planning run
    ///
    /// # Errors
    /// Returns the first `PlanError::Config` found.
    pub fn validate(&self) -> Result<()> {
        self.timetable.validate()?;
        self.google.validate()?;
        self.planner.validate()?;
        self.pipeline.validate()
    }
}

fn default_calendar_id() -> String {
    PRIMARY_CALENDAR_ID.to_string()
}

fn default_task_limit() -> u32 {
    DEFAULT_TASK_LIMIT
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

fn default_calendar_api_base() -> String {
    GOOGLE_CALENDAR_API_BASE.to_string()
}

fn default_tasks_api_base() -> String {
    GOOGLE_TASKS_API_BASE.to_string()
}

fn default_planner_model() -> String {
    DEFAULT_PLANNER_MODEL.to_string()
}

fn default_planner_url() -> String {
    DEFAULT_PLANNER_URL.to_string()
}
