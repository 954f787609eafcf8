//! buildgate CLI
//!
//! The `buildgate` command waits for a visual-regression build to finish
//! and fails the pipeline when too many comparisons changed.
//!
//! ## Commands
//!
//! - `wait`: poll the build, fetch its comparison totals, apply the gate
//! - `evaluate`: apply the gate to known totals without any network access
//!
//! Exit status is 0 when the gate passes and 1 on timeout, invalid
//! metrics, invalid settings or an exceeded threshold.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use buildgate_core::config::{
    validate_threshold, DEFAULT_API_BASE, DEFAULT_INTERVAL_SECS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_THRESHOLD_PERCENT, ENV_API_BASE, ENV_BUILD_ID,
    ENV_TOKEN,
};
use buildgate_core::{
    evaluate, run_gate, ComparisonMetrics, GateError, GateReport, HttpBuildApi, PollConfig,
};

#[derive(Parser)]
#[command(name = "buildgate")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Wait for a visual-regression build and gate on changed comparisons", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the build until it finishes, then apply the threshold gate
    Wait {
        /// Build identifier
        #[arg(long, env = ENV_BUILD_ID)]
        build_id: String,

        /// API token
        #[arg(long, env = ENV_TOKEN, hide_env_values = true)]
        token: String,

        /// Build-status API base URL
        #[arg(long, env = ENV_API_BASE, default_value = DEFAULT_API_BASE)]
        api_base: String,

        /// Seconds to wait between status requests
        #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS)]
        interval: u64,

        /// Maximum number of status requests
        #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
        max_attempts: u32,

        /// Highest passing percentage of changed comparisons
        #[arg(long, default_value_t = DEFAULT_THRESHOLD_PERCENT)]
        threshold: f64,

        /// Per-request HTTP timeout in seconds
        #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
        request_timeout: u64,

        /// Write a JSON report of the run to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Apply the threshold gate to known comparison totals
    Evaluate {
        /// Comparisons flagged as changed
        #[arg(long)]
        diff: u64,

        /// Comparisons completed
        #[arg(long)]
        finished: u64,

        /// Highest passing percentage of changed comparisons
        #[arg(long, default_value_t = DEFAULT_THRESHOLD_PERCENT)]
        threshold: f64,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    buildgate_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Wait {
            build_id,
            token,
            api_base,
            interval,
            max_attempts,
            threshold,
            request_timeout,
            report,
        } => {
            let config = PollConfig::new(&api_base, &build_id, &token)
                .with_interval(Duration::from_secs(interval))
                .with_max_attempts(max_attempts)
                .with_threshold(threshold)
                .with_request_timeout(Duration::from_secs(request_timeout));
            cmd_wait(&config, report).await
        }
        Commands::Evaluate {
            diff,
            finished,
            threshold,
        } => cmd_evaluate(diff, finished, threshold),
    }
}

/// Poll, fetch metrics and gate
async fn cmd_wait(config: &PollConfig, report_path: Option<PathBuf>) -> Result<()> {
    config.validate().context("Invalid gate settings")?;
    let api = HttpBuildApi::new(config).context("Failed to create HTTP client")?;

    let outcome = run_gate(&api, config).await;

    if let Some(path) = report_path {
        GateReport::from_outcome(&outcome)
            .write_json(&path)
            .with_context(|| format!("Failed to write report to {:?}", path))?;
        info!(path = %path.display(), "Wrote gate report");
    }

    let verdict = outcome.context("Build gate failed")?;
    println!("{}", verdict.reason);
    Ok(())
}

/// Gate known totals
fn cmd_evaluate(diff: u64, finished: u64, threshold: f64) -> Result<()> {
    validate_threshold(threshold).context("Invalid gate settings")?;

    let verdict = evaluate(&ComparisonMetrics { diff, finished }, threshold);
    println!("{}", verdict.reason);

    if verdict.passed {
        Ok(())
    } else {
        Err(GateError::ThresholdExceeded { verdict }).context("Build gate failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_wait_defaults() {
        let cli = Cli::try_parse_from([
            "buildgate",
            "wait",
            "--build-id",
            "123",
            "--token",
            "secret",
        ])
        .unwrap();

        match cli.command {
            Commands::Wait {
                build_id,
                interval,
                max_attempts,
                threshold,
                report,
                ..
            } => {
                assert_eq!(build_id, "123");
                assert_eq!(interval, 10);
                assert_eq!(max_attempts, 60);
                assert_eq!(threshold, 50.0);
                assert!(report.is_none());
            }
            Commands::Evaluate { .. } => panic!("expected wait"),
        }
    }

    #[test]
    fn test_evaluate_exit_contract() {
        assert!(cmd_evaluate(10, 100, 50.0).is_ok());
        assert!(cmd_evaluate(50, 100, 50.0).is_ok());
        assert!(cmd_evaluate(0, 0, 50.0).is_ok());
        assert!(cmd_evaluate(60, 100, 50.0).is_err());
        assert!(cmd_evaluate(1, 10, -5.0).is_err());
    }
}
