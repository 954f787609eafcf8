//! Build status observations and the polling state machine.
//!
//! [`PollState`] is a small immutable value: each attempt consumes the
//! current state and returns the next one. `Finished` and `TimedOut` are
//! terminal and absorb any further observation.

use serde_json::Value;

use crate::error::TransientPollError;

/// The only state the service reports for a completed build.
pub const FINISHED_STATE: &str = "finished";

/// One observation of the build, created per poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStatus {
    /// Lifecycle state reported by the service (e.g. "pending")
    pub state: String,
    /// 1-based attempt that produced this observation
    pub attempt: u32,
}

impl BuildStatus {
    pub fn is_finished(&self) -> bool {
        self.state == FINISHED_STATE
    }
}

/// Extract `data.attributes.state` from a build resource.
///
/// Missing, non-string and blank values are reported as
/// [`TransientPollError::MissingState`]. Other values are returned as sent,
/// so a padded `" finished "` is not the terminal state.
pub fn parse_state(body: &Value) -> Result<String, TransientPollError> {
    match body["data"]["attributes"]["state"].as_str() {
        Some(state) if !state.trim().is_empty() => Ok(state.to_string()),
        _ => Err(TransientPollError::MissingState),
    }
}

/// Polling state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// Still polling; `attempt` requests have been made so far.
    Polling {
        attempt: u32,
        last_state: Option<String>,
    },
    /// A "finished" state was observed on attempt `attempts`.
    Finished { attempts: u32 },
    /// The budget ran out without a "finished" observation.
    TimedOut {
        attempts: u32,
        last_state: Option<String>,
    },
}

impl PollState {
    /// Initial state before the first request.
    ///
    /// A zero budget is already exhausted: no request may be made.
    pub fn start(max_attempts: u32) -> Self {
        if max_attempts == 0 {
            PollState::TimedOut {
                attempts: 0,
                last_state: None,
            }
        } else {
            PollState::Polling {
                attempt: 0,
                last_state: None,
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Polling { .. })
    }

    /// Number of requests made so far.
    pub fn attempts(&self) -> u32 {
        match self {
            PollState::Polling { attempt, .. } => *attempt,
            PollState::Finished { attempts } | PollState::TimedOut { attempts, .. } => *attempts,
        }
    }

    /// Fold one attempt's observation into the next state.
    ///
    /// A failed observation keeps the previously seen state, so a timeout
    /// reports the last real state the service returned.
    pub fn advance(
        self,
        observation: Result<BuildStatus, TransientPollError>,
        max_attempts: u32,
    ) -> Self {
        let (attempt, previous) = match self {
            PollState::Polling {
                attempt,
                last_state,
            } => (attempt + 1, last_state),
            terminal => return terminal,
        };

        let last_state = match observation {
            Ok(status) if status.is_finished() => {
                return PollState::Finished { attempts: attempt }
            }
            Ok(status) => Some(status.state),
            Err(_) => previous,
        };

        if attempt >= max_attempts {
            PollState::TimedOut {
                attempts: attempt,
                last_state,
            }
        } else {
            PollState::Polling {
                attempt,
                last_state,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn observed(state: &str, attempt: u32) -> Result<BuildStatus, TransientPollError> {
        Ok(BuildStatus {
            state: state.to_string(),
            attempt,
        })
    }

    #[test]
    fn test_parse_state() {
        let body = json!({ "data": { "attributes": { "state": "processing" } } });
        assert_eq!(parse_state(&body).unwrap(), "processing");
    }

    #[test]
    fn test_parse_state_missing_or_blank() {
        for body in [
            json!({}),
            json!({ "data": null }),
            json!({ "data": { "attributes": { "state": "" } } }),
            json!({ "data": { "attributes": { "state": "   " } } }),
            json!({ "data": { "attributes": { "state": 3 } } }),
        ] {
            assert!(matches!(
                parse_state(&body),
                Err(TransientPollError::MissingState)
            ));
        }
    }

    #[test]
    fn test_parse_state_keeps_padding() {
        let body = json!({ "data": { "attributes": { "state": " finished\n" } } });
        let state = parse_state(&body).unwrap();
        assert_eq!(state, " finished\n");

        let status = BuildStatus { state, attempt: 1 };
        assert!(!status.is_finished());
    }

    #[test]
    fn test_zero_budget_starts_timed_out() {
        let state = PollState::start(0);
        assert!(state.is_terminal());
        assert_eq!(
            state,
            PollState::TimedOut {
                attempts: 0,
                last_state: None
            }
        );
    }

    #[test]
    fn test_finished_is_terminal() {
        let state = PollState::start(5).advance(observed("finished", 1), 5);
        assert_eq!(state, PollState::Finished { attempts: 1 });
        assert!(state.is_terminal());
    }

    #[test]
    fn test_pending_keeps_polling() {
        let state = PollState::start(5).advance(observed("pending", 1), 5);
        assert_eq!(
            state,
            PollState::Polling {
                attempt: 1,
                last_state: Some("pending".to_string())
            }
        );
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_budget_exhaustion_times_out() {
        let state = PollState::start(2)
            .advance(observed("pending", 1), 2)
            .advance(observed("processing", 2), 2);
        assert_eq!(
            state,
            PollState::TimedOut {
                attempts: 2,
                last_state: Some("processing".to_string())
            }
        );
    }

    #[test]
    fn test_transient_error_keeps_last_state() {
        let state = PollState::start(3)
            .advance(observed("pending", 1), 3)
            .advance(Err(TransientPollError::MissingState), 3);
        assert_eq!(
            state,
            PollState::Polling {
                attempt: 2,
                last_state: Some("pending".to_string())
            }
        );
    }

    #[test]
    fn test_terminal_states_absorb_observations() {
        let finished = PollState::Finished { attempts: 3 };
        assert_eq!(
            finished.clone().advance(observed("pending", 4), 10),
            finished
        );

        let timed_out = PollState::TimedOut {
            attempts: 2,
            last_state: None,
        };
        assert_eq!(
            timed_out.clone().advance(observed("finished", 3), 10),
            timed_out
        );
    }

    #[test]
    fn test_finished_on_last_attempt_wins_over_timeout() {
        let state = PollState::start(2)
            .advance(observed("pending", 1), 2)
            .advance(observed("finished", 2), 2);
        assert_eq!(state, PollState::Finished { attempts: 2 });
    }
}
