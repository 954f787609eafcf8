//! Build-status poller.
//!
//! Requests the build resource until it reports "finished" or the attempt
//! budget runs out, sleeping `config.interval` between attempts. Failed or
//! unparseable attempts are logged and counted, never propagated.

use tracing::{info, warn};

use crate::client::BuildApi;
use crate::config::PollConfig;
use crate::error::TransientPollError;
use crate::status::{parse_state, BuildStatus, PollState};

/// Result of a polling run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome {
    /// Last state the service reported, if any attempt produced one
    pub final_state: Option<String>,
    /// Requests made
    pub attempts: u32,
    /// Whether "finished" was observed
    pub finished: bool,
}

/// Poll the build until it finishes or `config.max_attempts` is reached.
///
/// A zero budget makes no request and reports a timeout after 0 attempts.
pub async fn poll(api: &dyn BuildApi, config: &PollConfig) -> PollOutcome {
    let mut state = PollState::start(config.max_attempts);

    while !state.is_terminal() {
        let attempt = state.attempts() + 1;
        let observation = observe(api, config, attempt).await;

        match &observation {
            Ok(status) => info!(
                attempt,
                max_attempts = config.max_attempts,
                state = %status.state,
                "Polled build status"
            ),
            Err(e) => warn!(
                attempt,
                max_attempts = config.max_attempts,
                error = %e,
                "Build status unavailable, treating as not finished"
            ),
        }

        state = state.advance(observation, config.max_attempts);

        if !state.is_terminal() {
            tokio::time::sleep(config.interval).await;
        }
    }

    match state {
        PollState::Finished { attempts } => PollOutcome {
            final_state: Some(crate::status::FINISHED_STATE.to_string()),
            attempts,
            finished: true,
        },
        PollState::TimedOut {
            attempts,
            last_state,
        }
        | PollState::Polling {
            attempt: attempts,
            last_state,
        } => PollOutcome {
            final_state: last_state,
            attempts,
            finished: false,
        },
    }
}

async fn observe(
    api: &dyn BuildApi,
    config: &PollConfig,
    attempt: u32,
) -> Result<BuildStatus, TransientPollError> {
    let body = api.fetch_build(&config.endpoint).await?;
    let state = parse_state(&body)?;
    Ok(BuildStatus { state, attempt })
}
