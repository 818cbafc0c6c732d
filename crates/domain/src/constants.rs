//! Planner constants
//!
//! Centralized defaults shared by the config loader, the pipeline and the
//! integrations.

// Planning service contract
pub const ALREADY_PLANNED_SENTINEL: &str = "plan already created";

// Pipeline defaults
pub const DEFAULT_FAN_OUT_LIMIT: usize = 5;
pub const DEFAULT_MAX_INSERT_ATTEMPTS: u32 = 3;
pub const DEFAULT_INSERT_BACKOFF_MS: u64 = 250;
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_AI_LOOKAHEAD_DAYS: i64 = 7;
pub const DEFAULT_TIME_ZONE: &str = "Europe/Prague";
pub const DEFAULT_TASK_LIMIT: u32 = 100;

// Calendar conventions
pub const PRIMARY_CALENDAR_ID: &str = "primary";

// Planning service defaults
pub const DEFAULT_PLANNER_MODEL: &str = "gpt-4.1";
pub const DEFAULT_PLANNER_URL: &str = "https://api.openai.com/v1/responses";

// Google API endpoints
pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const GOOGLE_TASKS_API_BASE: &str = "https://tasks.googleapis.com/tasks/v1";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_API_SCOPES: &str =
    "https://www.googleapis.com/auth/calendar https://www.googleapis.com/auth/tasks";
