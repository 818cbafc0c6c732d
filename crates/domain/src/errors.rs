//! Error types used throughout the planner

use std::time::Duration;

use thiserror::Error;

/// Main error type for a planning run
///
/// Variants follow the run's error taxonomy: configuration and
/// authentication problems are fatal preconditions, lookup and parse
/// failures abort the run before any calendar mutation, and transport
/// failures are retryable only at single-insert granularity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Authentication error: {message}")]
    Auth { message: String },

    #[error("No ending time mapped for {count} periods ({day})")]
    Lookup { count: usize, day: String },

    #[error("Failed to parse planner response{}: {reason}", .index.map(|i| format!(" at element {i}")).unwrap_or_default())]
    Parse { index: Option<usize>, reason: String, raw: String },

    #[error("{} of {} event insertions failed", .failed.len(), .failed.len() + .succeeded)]
    PartialCommit { succeeded: usize, failed: Vec<String> },

    #[error("Pipeline timed out after {0:?}")]
    PipelineTimeout(Duration),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlanError {
    /// Configuration error with the given message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Transport (network/timeout) error with the given message
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    /// Authentication error with the given message
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth { message: message.into() }
    }

    /// Invalid input error with the given message
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput { message: message.into() }
    }

    /// Internal error with the given message
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Returns true if retrying the failed operation can succeed
    ///
    /// Transport failures and HTTP 408/429/5xx responses are transient;
    /// everything else is deterministic for the current input.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Api { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Stable label suitable for structured logging
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Transport { .. } => "transport",
            Self::Auth { .. } => "auth",
            Self::Lookup { .. } => "lookup",
            Self::Parse { .. } => "parse",
            Self::PartialCommit { .. } => "partial_commit",
            Self::PipelineTimeout(_) => "pipeline_timeout",
            Self::Api { .. } => "api",
            Self::InvalidInput { .. } => "invalid_input",
            Self::Internal { .. } => "internal",
        }
    }
}

/// Result type alias for planner operations
pub type Result<T> = std::result::Result<T, PlanError>;
