//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use serde::Deserialize;
use serde_json::Error as JsonError;
use weekplan_domain::PlanError;

/// Longest response body excerpt carried in an error message
const MAX_BODY_EXCERPT: usize = 512;

/// Google error reasons that signal quota exhaustion rather than a
/// permission problem
const RATE_LIMIT_REASONS: &[&str] =
    &["rateLimitExceeded", "userRateLimitExceeded", "quotaExceeded"];

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub PlanError);

impl From<InfraError> for PlanError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<PlanError> for InfraError {
    fn from(value: PlanError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoPlanError {
    fn into_plan_error(self) -> PlanError;
}

/// Domain error for a non-success HTTP status
///
/// 401/403 are authentication failures; every other status keeps its code
/// so callers can decide on retries (408/429/5xx) or special cases (404,
/// 409). A 403 whose body names a quota reason is reported as 429.
pub fn status_error(status: u16, body: &str) -> PlanError {
    let rate_limited = status == 403 && is_rate_limited(body);
    let mut message = body.trim().to_string();
    if message.len() > MAX_BODY_EXCERPT {
        let cut = (0..=MAX_BODY_EXCERPT).rev().find(|i| message.is_char_boundary(*i)).unwrap_or(0);
        message.truncate(cut);
        message.push_str("...");
    }
    if message.is_empty() {
        message = format!("HTTP {status}");
    }

    match status {
        403 if rate_limited => {
            PlanError::Api { status: 429, message: format!("HTTP 403 rate limited: {message}") }
        }
        401 | 403 => PlanError::auth(format!("HTTP {status}: {message}")),
        _ => PlanError::Api { status, message },
    }
}

fn is_rate_limited(body: &str) -> bool {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return false;
    };
    envelope.error.status.as_deref() == Some("RESOURCE_EXHAUSTED")
        || envelope
            .error
            .errors
            .iter()
            .filter_map(|detail| detail.reason.as_deref())
            .any(|reason| RATE_LIMIT_REASONS.contains(&reason))
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → PlanError */
/* -------------------------------------------------------------------------- */

impl IntoPlanError for HttpError {
    fn into_plan_error(self) -> PlanError {
        if self.is_timeout() {
            return PlanError::transport("HTTP request timed out");
        }

        if self.is_connect() {
            return PlanError::transport("HTTP connection failure");
        }

        if let Some(status) = self.status() {
            let reason = status.canonical_reason().unwrap_or("unknown status");
            return status_error(status.as_u16(), reason);
        }

        if self.is_decode() {
            return PlanError::internal(format!("unexpected HTTP response body: {self}"));
        }

        if self.is_builder() {
            return PlanError::invalid_input(format!("invalid HTTP request: {self}"));
        }

        PlanError::transport(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_plan_error())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → PlanError */
/* -------------------------------------------------------------------------- */

impl IntoPlanError for JsonError {
    fn into_plan_error(self) -> PlanError {
        PlanError::internal(format!("unexpected JSON payload: {self}"))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_plan_error())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
