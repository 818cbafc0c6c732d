//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Without an explicit path, attempts to load entirely from environment
//!    variables
//! 2. If incomplete, falls back to a config file (explicit or probed)
//! 3. Environment variables that are set always override file values, so
//!    secrets can stay out of the file
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `WEEKPLAN_TIMETABLE_URL`: Timetable service base URL (required)
//! - `WEEKPLAN_TIMETABLE_USERNAME` / `BAK_USERNAME`: Timetable login
//! - `WEEKPLAN_TIMETABLE_PASSWORD` / `BAK_PASSWORD`: Timetable password
//! - `WEEKPLAN_TIMETABLE_MODE`: `actual` or `permanent`
//! - `WEEKPLAN_AI_CALENDAR_ID`: Calendar the plan is written to (required)
//! - `WEEKPLAN_CALENDAR_ID` / `GOOGLE_CALENDAR_ID`: Calendar read for context
//! - `WEEKPLAN_TASK_LIST_ID`, `WEEKPLAN_TASK_LIMIT`: Task list to read
//! - `WEEKPLAN_GOOGLE_ACCESS_TOKEN`: Static Google access token
//! - `WEEKPLAN_GOOGLE_CLIENT_EMAIL` / `GOOGLE_CLIENT_EMAIL`,
//!   `WEEKPLAN_GOOGLE_PRIVATE_KEY` / `GOOGLE_PRIVATE_KEY`: Service account
//!   (literal `\n` sequences in the key are accepted)
//! - `WEEKPLAN_GOOGLE_REFRESH_TOKEN`, `WEEKPLAN_GOOGLE_CLIENT_ID`,
//!   `WEEKPLAN_GOOGLE_CLIENT_SECRET`: Refresh-token grant
//! - `WEEKPLAN_PLANNER_API_KEY` / `OPENAI_API_KEY`: Planning service key
//! - `WEEKPLAN_PLANNER_MODEL`, `WEEKPLAN_PLANNER_URL`
//! - `WEEKPLAN_FAN_OUT_LIMIT`, `WEEKPLAN_MAX_INSERT_ATTEMPTS`,
//!   `WEEKPLAN_INSERT_BACKOFF_MS`, `WEEKPLAN_RUN_TIMEOUT_SECS`,
//!   `WEEKPLAN_AI_LOOKAHEAD_DAYS`, `WEEKPLAN_TIME_ZONE`
//! - `WEEKPLAN_PREFERENCES`: Free-text preferences
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./weekplan.toml` or `./weekplan.json` (current working directory)
//! 2. `./config.toml` or `./config.json`
//! 3. `$XDG_CONFIG_HOME/weekplan/config.toml` (or `~/.config/...`)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use weekplan_domain::constants::PRIMARY_CALENDAR_ID;
use weekplan_domain::{
    AppConfig, GoogleConfig, PipelineConfig, PlanError, PlannerConfig, Result, Secret,
    TimetableConfig, TimetableMode,
};

/// Variable lookup; the process environment in production.
type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Load configuration with automatic fallback strategy
///
/// With `path` set, the file is loaded and environment overrides applied.
/// Otherwise the environment is tried first and the probed file is the
/// fallback.
///
/// # Errors
/// Returns `PlanError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A variable has an invalid value
pub fn load(path: Option<PathBuf>) -> Result<AppConfig> {
    if path.is_none() {
        match load_from_env() {
            Ok(config) => {
                tracing::info!("Configuration loaded from environment variables");
                return Ok(config);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Environment incomplete, trying config file");
            }
        }
    }

    let mut config = load_from_file(path)?;
    apply_overrides(&mut config, &env_lookup)?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// `WEEKPLAN_TIMETABLE_URL` and `WEEKPLAN_AI_CALENDAR_ID` must be set;
/// everything else has defaults or is validated later.
///
/// # Errors
/// Returns `PlanError::Config` if required variables are missing or a
/// value cannot be parsed.
pub fn load_from_env() -> Result<AppConfig> {
    config_from_lookup(&env_lookup)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `PlanError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<AppConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(PlanError::config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            PlanError::config(
                "No configuration in the environment and no config file in any standard location",
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| PlanError::config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| PlanError::config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| PlanError::config(format!("Invalid JSON format: {e}"))),
        _ => Err(PlanError::config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend([
            cwd.join("weekplan.toml"),
            cwd.join("weekplan.json"),
            cwd.join("config.toml"),
            cwd.join("config.json"),
        ]);
    }

    let config_home = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")));
    if let Some(dir) = config_home {
        candidates.extend([dir.join("weekplan/config.toml"), dir.join("weekplan/config.json")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend([exe_dir.join("weekplan.toml"), exe_dir.join("weekplan.json")]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn config_from_lookup(lookup: Lookup<'_>) -> Result<AppConfig> {
    let base_url = required(lookup, "WEEKPLAN_TIMETABLE_URL")?;
    let ai_calendar_id = required(lookup, "WEEKPLAN_AI_CALENDAR_ID")?;

    let mut config = AppConfig {
        timetable: TimetableConfig {
            base_url,
            username: None,
            password: None,
            mode: TimetableMode::default(),
        },
        google: GoogleConfig::new(PRIMARY_CALENDAR_ID, ai_calendar_id),
        planner: PlannerConfig::default(),
        pipeline: PipelineConfig::default(),
        preferences: String::new(),
    };
    apply_overrides(&mut config, lookup)?;
    Ok(config)
}

/// Overwrite config values with every variable that is set
fn apply_overrides(config: &mut AppConfig, lookup: Lookup<'_>) -> Result<()> {
    let timetable = &mut config.timetable;
    set(&mut timetable.base_url, first(lookup, &["WEEKPLAN_TIMETABLE_URL"]));
    set_opt(
        &mut timetable.username,
        first(lookup, &["WEEKPLAN_TIMETABLE_USERNAME", "BAK_USERNAME"]),
    );
    set_opt(
        &mut timetable.password,
        secret(lookup, &["WEEKPLAN_TIMETABLE_PASSWORD", "BAK_PASSWORD"]),
    );
    set(&mut timetable.mode, parsed(lookup, "WEEKPLAN_TIMETABLE_MODE")?);

    let google = &mut config.google;
    set(&mut google.calendar_id, first(lookup, &["WEEKPLAN_CALENDAR_ID", "GOOGLE_CALENDAR_ID"]));
    set(&mut google.ai_calendar_id, first(lookup, &["WEEKPLAN_AI_CALENDAR_ID"]));
    set_opt(&mut google.task_list_id, first(lookup, &["WEEKPLAN_TASK_LIST_ID"]));
    set(&mut google.task_limit, parsed(lookup, "WEEKPLAN_TASK_LIMIT")?);
    set_opt(&mut google.access_token, secret(lookup, &["WEEKPLAN_GOOGLE_ACCESS_TOKEN"]));
    set_opt(
        &mut google.client_email,
        first(lookup, &["WEEKPLAN_GOOGLE_CLIENT_EMAIL", "GOOGLE_CLIENT_EMAIL"]),
    );
    set_opt(
        &mut google.private_key,
        secret(lookup, &["WEEKPLAN_GOOGLE_PRIVATE_KEY", "GOOGLE_PRIVATE_KEY"]),
    );
    set_opt(&mut google.refresh_token, secret(lookup, &["WEEKPLAN_GOOGLE_REFRESH_TOKEN"]));
    set_opt(&mut google.client_id, first(lookup, &["WEEKPLAN_GOOGLE_CLIENT_ID"]));
    set_opt(&mut google.client_secret, secret(lookup, &["WEEKPLAN_GOOGLE_CLIENT_SECRET"]));

    let planner = &mut config.planner;
    set_opt(&mut planner.api_key, secret(lookup, &["WEEKPLAN_PLANNER_API_KEY", "OPENAI_API_KEY"]));
    set(&mut planner.model, first(lookup, &["WEEKPLAN_PLANNER_MODEL"]));
    set(&mut planner.api_url, first(lookup, &["WEEKPLAN_PLANNER_URL"]));

    let pipeline = &mut config.pipeline;
    set(&mut pipeline.fan_out_limit, parsed(lookup, "WEEKPLAN_FAN_OUT_LIMIT")?);
    set(&mut pipeline.max_insert_attempts, parsed(lookup, "WEEKPLAN_MAX_INSERT_ATTEMPTS")?);
    set(&mut pipeline.insert_backoff_ms, parsed(lookup, "WEEKPLAN_INSERT_BACKOFF_MS")?);
    set(&mut pipeline.run_timeout_secs, parsed(lookup, "WEEKPLAN_RUN_TIMEOUT_SECS")?);
    set(&mut pipeline.ai_lookahead_days, parsed(lookup, "WEEKPLAN_AI_LOOKAHEAD_DAYS")?);
    set(&mut pipeline.time_zone, first(lookup, &["WEEKPLAN_TIME_ZONE"]));

    set(&mut config.preferences, first(lookup, &["WEEKPLAN_PREFERENCES"]));
    Ok(())
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

fn set_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// First non-empty value among `keys`
fn first(lookup: Lookup<'_>, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|key| lookup(key)).map(|v| v.trim().to_string()).find(|v| !v.is_empty())
}

fn secret(lookup: Lookup<'_>, keys: &[&str]) -> Option<Secret> {
    first(lookup, keys).map(Secret::new)
}

fn required(lookup: Lookup<'_>, key: &str) -> Result<String> {
    first(lookup, &[key])
        .ok_or_else(|| PlanError::config(format!("Missing required environment variable: {key}")))
}

fn parsed<T>(lookup: Lookup<'_>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    first(lookup, &[key])
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| PlanError::config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}
