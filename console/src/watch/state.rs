//! Poll state machine
//!
//! Whether a recurring status check should run is a single tagged state with
//! one transition function, not a set of scattered booleans.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::job::Job;

/// Polling state for one watcher instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// No recurring check is scheduled
    Idle,

    /// A recurring check is live for `job_id`
    Polling {
        job_id: String,
        since: DateTime<Utc>,
    },
}

/// Edge produced by a state evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Stopped,
    Unchanged,
}

/// A job qualifies for polling while it has not been picked up yet and is
/// strictly younger than `max_age`. Age is measured against wall-clock `now`
/// at every evaluation.
pub fn is_eligible(job: &Job, now: DateTime<Utc>, max_age: Duration) -> bool {
    job.status.is_unsettled() && job.age(now) < max_age
}

impl PollState {
    pub fn new() -> Self {
        PollState::Idle
    }

    pub fn is_polling(&self) -> bool {
        matches!(self, PollState::Polling { .. })
    }

    /// Id of the job currently being polled
    pub fn target(&self) -> Option<&str> {
        match self {
            PollState::Polling { job_id, .. } => Some(job_id),
            PollState::Idle => None,
        }
    }

    /// Re-evaluate against the current candidate (the newest job in the
    /// list) and transition accordingly.
    ///
    /// Starting is idempotent: evaluating an already-Polling state against
    /// an eligible candidate never produces a second `Started` edge. A
    /// candidate change while polling re-targets in place without an edge.
    pub fn advance(
        &mut self,
        candidate: Option<&Job>,
        now: DateTime<Utc>,
        max_age: Duration,
    ) -> Transition {
        let eligible_id = candidate
            .filter(|job| is_eligible(job, now, max_age))
            .map(|job| job.id.clone());

        match eligible_id {
            Some(id) => match self {
                PollState::Idle => {
                    *self = PollState::Polling {
                        job_id: id,
                        since: now,
                    };
                    Transition::Started
                }
                PollState::Polling { job_id, since } => {
                    if *job_id != id {
                        *job_id = id;
                        *since = now;
                    }
                    Transition::Unchanged
                }
            },
            None => {
                if self.is_polling() {
                    *self = PollState::Idle;
                    Transition::Stopped
                } else {
                    Transition::Unchanged
                }
            }
        }
    }
}

impl Default for PollState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobStatus;

    const MAX_AGE: Duration = Duration::from_secs(600);

    fn job(id: &str, status: JobStatus, age_secs: i64) -> Job {
        let now = Utc::now();
        Job {
            id: id.to_string(),
            status,
            created_at: now - chrono::Duration::seconds(age_secs),
            updated_at: now,
            input: None,
            user_id: None,
        }
    }

    #[test]
    fn test_eligibility_by_status() {
        let now = Utc::now();
        assert!(is_eligible(&job("a", JobStatus::Pending, 0), now, MAX_AGE));
        assert!(is_eligible(&job("a", JobStatus::Queued, 0), now, MAX_AGE));
        assert!(!is_eligible(&job("a", JobStatus::Running, 0), now, MAX_AGE));
        assert!(!is_eligible(&job("a", JobStatus::Completed, 0), now, MAX_AGE));
        assert!(!is_eligible(&job("a", JobStatus::Failed, 0), now, MAX_AGE));
    }

    #[test]
    fn test_eligibility_age_cutoff_is_strict() {
        let pending = job("a", JobStatus::Pending, 0);
        let now = pending.created_at + chrono::Duration::seconds(600);

        // exactly at the cutoff: no longer eligible
        assert!(!is_eligible(&pending, now, MAX_AGE));
        assert!(is_eligible(
            &pending,
            now - chrono::Duration::seconds(1),
            MAX_AGE
        ));
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut state = PollState::new();
        let candidate = job("abc123", JobStatus::Pending, 10);
        let now = Utc::now();

        assert_eq!(
            state.advance(Some(&candidate), now, MAX_AGE),
            Transition::Started
        );
        assert_eq!(
            state.advance(Some(&candidate), now, MAX_AGE),
            Transition::Unchanged
        );
        assert!(state.is_polling());
        assert_eq!(state.target(), Some("abc123"));
    }

    #[test]
    fn test_stops_when_status_settles() {
        let mut state = PollState::new();
        let now = Utc::now();

        state.advance(Some(&job("abc123", JobStatus::Queued, 10)), now, MAX_AGE);
        assert!(state.is_polling());

        let settled = job("abc123", JobStatus::Running, 15);
        assert_eq!(
            state.advance(Some(&settled), now, MAX_AGE),
            Transition::Stopped
        );
        assert_eq!(state, PollState::Idle);
    }

    #[test]
    fn test_stops_when_candidate_ages_out() {
        let mut state = PollState::new();
        let now = Utc::now();

        state.advance(Some(&job("abc123", JobStatus::Pending, 10)), now, MAX_AGE);
        assert!(state.is_polling());

        let stale = job("abc123", JobStatus::Pending, 601);
        assert_eq!(
            state.advance(Some(&stale), now, MAX_AGE),
            Transition::Stopped
        );
    }

    #[test]
    fn test_retargets_newer_candidate_without_edge() {
        let mut state = PollState::new();
        let now = Utc::now();

        state.advance(Some(&job("old", JobStatus::Pending, 60)), now, MAX_AGE);
        let transition = state.advance(Some(&job("new", JobStatus::Queued, 5)), now, MAX_AGE);

        assert_eq!(transition, Transition::Unchanged);
        assert_eq!(state.target(), Some("new"));
    }

    #[test]
    fn test_empty_list_is_idle() {
        let mut state = PollState::new();
        assert_eq!(
            state.advance(None, Utc::now(), MAX_AGE),
            Transition::Unchanged
        );
        assert!(!state.is_polling());
    }
}
