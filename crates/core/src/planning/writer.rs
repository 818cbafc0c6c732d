//! Bounded concurrent commit of proposed events

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use weekplan_domain::constants::{DEFAULT_INSERT_BACKOFF_MS, DEFAULT_MAX_INSERT_ATTEMPTS};
use weekplan_domain::{CommitReport, EventOutcome, InsertResult, ProposedEvent, Result};

use super::ports::CalendarWorkspace;

/// Length of generated event ids (Google accepts 5..=1024 base32hex chars)
const EVENT_ID_LEN: usize = 32;

/// Retry schedule for a single insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on every further retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_INSERT_ATTEMPTS,
            initial_delay: Duration::from_millis(DEFAULT_INSERT_BACKOFF_MS),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt number `attempt` (1-based)
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_delay.saturating_mul(1 << exponent).min(self.max_delay)
    }
}

/// Commits proposals to the AI-plan calendar
///
/// Insertions run as independent tasks, at most `fan_out` at a time. Each
/// writes its own outcome slot; one failure never cancels the others. Every
/// event gets a deterministic id before its first attempt, so a retry after
/// an ambiguous failure cannot create a duplicate.
pub struct CalendarWriter {
    workspace: Arc<dyn CalendarWorkspace>,
    calendar_id: String,
    fan_out: usize,
    retry: RetryPolicy,
}

impl CalendarWriter {
    /// Writer for `calendar_id` running at most `fan_out` insertions at once
    ///
    /// A `fan_out` of zero is treated as one.
    pub fn new(
        workspace: Arc<dyn CalendarWorkspace>,
        calendar_id: impl Into<String>,
        fan_out: usize,
        retry: RetryPolicy,
    ) -> Self {
        Self { workspace, calendar_id: calendar_id.into(), fan_out: fan_out.max(1), retry }
    }

    /// Insert every event and report per-event outcomes in input order
    ///
    /// Failed insertions are reported, not raised.
    ///
    /// # Errors
    /// Only a failed authentication precondition, checked once before any
    /// insertion is dispatched. Empty input returns an empty report without
    /// touching the workspace.
    #[instrument(skip_all, fields(calendar_id = %self.calendar_id, events = events.len()))]
    pub async fn commit(&self, events: Vec<ProposedEvent>) -> Result<CommitReport> {
        if events.is_empty() {
            debug!("Nothing to commit");
            return Ok(CommitReport::default());
        }

        self.workspace.ensure_authenticated().await?;

        let semaphore = Arc::new(Semaphore::new(self.fan_out));
        let handles: Vec<_> = events
            .into_iter()
            .map(|mut event| {
                if event.id.is_none() {
                    event.id = Some(event_id(&self.calendar_id, &event));
                }
                let slot = event.clone();
                let task = insert_with_retry(
                    Arc::clone(&self.workspace),
                    Arc::clone(&semaphore),
                    self.calendar_id.clone(),
                    event,
                    self.retry,
                );
                (slot, tokio::spawn(task))
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (event, handle) in handles {
            let outcome = handle.await.unwrap_or_else(|e| EventOutcome {
                event,
                result: InsertResult::Failed { reason: format!("insert task aborted: {e}") },
                attempts: 0,
            });
            outcomes.push(outcome);
        }

        let report = CommitReport::new(outcomes);
        info!(
            succeeded = report.succeeded(),
            failed = report.outcomes.len() - report.succeeded(),
            "Commit finished"
        );
        Ok(report)
    }
}

async fn insert_with_retry(
    workspace: Arc<dyn CalendarWorkspace>,
    semaphore: Arc<Semaphore>,
    calendar_id: String,
    event: ProposedEvent,
    retry: RetryPolicy,
) -> EventOutcome {
    let Ok(_permit) = semaphore.acquire_owned().await else {
        return EventOutcome {
            event,
            result: InsertResult::Failed { reason: "insert slot unavailable".to_string() },
            attempts: 0,
        };
    };

    let mut attempt = 0;
    loop {
        attempt += 1;
        match workspace.insert_event(&calendar_id, &event).await {
            Ok(id) => {
                debug!(event = %event.label(), %id, attempt, "Inserted event");
                return EventOutcome {
                    event,
                    result: InsertResult::Inserted { id },
                    attempts: attempt,
                };
            }
            Err(e) if e.is_retryable() && attempt < retry.max_attempts => {
                let delay = retry.calculate_delay(attempt);
                warn!(
                    event = %event.label(),
                    attempt,
                    ?delay,
                    error = %e,
                    "Insert failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(
                    event = %event.label(),
                    attempt,
                    error_kind = e.label(),
                    error = %e,
                    "Insert failed"
                );
                return EventOutcome {
                    event,
                    result: InsertResult::Failed { reason: e.to_string() },
                    attempts: attempt,
                };
            }
        }
    }
}

/// Deterministic event id from calendar, start instant and summary
///
/// Lowercase hex is a subset of the base32hex alphabet calendar ids use.
pub fn event_id(calendar_id: &str, event: &ProposedEvent) -> String {
    let mut hasher = Sha256::new();
    hasher.update(calendar_id.as_bytes());
    hasher.update([0]);
    hasher.update(event.start.date_time.timestamp().to_be_bytes());
    hasher.update([0]);
    hasher.update(event.summary.trim().as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(EVENT_ID_LEN);
    id
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use weekplan_domain::EventDateTime;

    use super::*;

    fn event(summary: &str, start: &str) -> ProposedEvent {
        let start = DateTime::parse_from_rfc3339(start).unwrap();
        ProposedEvent {
            id: None,
            summary: summary.into(),
            description: None,
            location: None,
            start: EventDateTime { date_time: start, time_zone: "Europe/Prague".into() },
            end: EventDateTime {
                date_time: start + chrono::Duration::hours(1),
                time_zone: "Europe/Prague".into(),
            },
            color_id: None,
        }
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
        };

        assert_eq!(policy.calculate_delay(1), Duration::from_millis(100));
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(200));
        assert_eq!(policy.calculate_delay(3), Duration::from_millis(350));
    }

    #[test]
    fn event_id_is_stable_and_instant_based() {
        let a = event("Judo", "2025-07-16T17:10:00+02:00");
        let same_instant = event("Judo", "2025-07-16T15:10:00Z");

        assert_eq!(event_id("ai", &a), event_id("ai", &same_instant));
        assert_eq!(event_id("ai", &a).len(), EVENT_ID_LEN);
        assert!(event_id("ai", &a).chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn event_id_differs_by_calendar_and_summary() {
        let a = event("Judo", "2025-07-16T17:10:00+02:00");
        let b = event("Gym", "2025-07-16T17:10:00+02:00");

        assert_ne!(event_id("ai", &a), event_id("ai", &b));
        assert_ne!(event_id("ai", &a), event_id("other", &a));
    }
}
