//! End-to-end gated run: poll, fetch metrics once, evaluate.

use tracing::{error, info, warn};

use crate::client::BuildApi;
use crate::config::PollConfig;
use crate::error::{GateError, Result};
use crate::gate::{evaluate, Verdict};
use crate::metrics::fetch_metrics;
use crate::poller::poll;

/// Wait for the build to finish and gate on its comparison metrics.
///
/// Returns the passing verdict, or the fatal error that should fail the
/// pipeline. Nothing is retried once the build has been seen finished.
pub async fn run_gate(api: &dyn BuildApi, config: &PollConfig) -> Result<Verdict> {
    config.validate()?;

    info!(
        endpoint = %config.endpoint,
        max_attempts = config.max_attempts,
        interval_secs = config.interval.as_secs(),
        "Waiting for build to finish"
    );

    let outcome = poll(api, config).await;
    if !outcome.finished {
        error!(
            attempts = outcome.attempts,
            last_state = outcome.final_state.as_deref().unwrap_or("unknown"),
            "Build did not finish within the attempt budget"
        );
        return Err(GateError::Timeout {
            attempts: outcome.attempts,
            last_state: outcome.final_state,
        });
    }
    info!(attempts = outcome.attempts, "Build finished");

    let metrics = fetch_metrics(api, config).await?;
    let verdict = evaluate(&metrics, config.threshold_percent);

    if !verdict.passed {
        error!(
            percentage = verdict.percentage,
            threshold = verdict.threshold,
            "{}",
            verdict.reason
        );
        return Err(GateError::ThresholdExceeded { verdict });
    }

    if metrics.finished == 0 {
        warn!("{}", verdict.reason);
    } else {
        info!(
            percentage = verdict.percentage,
            threshold = verdict.threshold,
            "{}",
            verdict.reason
        );
    }
    Ok(verdict)
}
