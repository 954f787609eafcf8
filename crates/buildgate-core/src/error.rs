//! Error taxonomy for buildgate.
//!
//! Errors are split by whether the poller may retry them:
//! [`TransientPollError`] is swallowed inside the polling budget, while
//! [`FetchError`] and [`GateError`] end the run.

use thiserror::Error;

use crate::gate::Verdict;

/// Errors raised by the build-status HTTP collaborator.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure (connect, TLS, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Server answered with a non-success status
    #[error("build API returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Body was not valid JSON
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err.to_string())
    }
}

/// A single poll attempt that did not yield a usable state.
///
/// Counted against the attempt budget, never propagated out of the poller.
#[derive(Error, Debug)]
pub enum TransientPollError {
    #[error("status request failed: {0}")]
    Request(#[from] ApiError),

    #[error("response had no build state")]
    MissingState,
}

/// Errors from the one-shot metrics fetch after the build finished.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("metrics request failed: {0}")]
    Api(#[from] ApiError),

    #[error("invalid metric {field}: {value}")]
    InvalidMetrics { field: String, value: String },
}

/// Invalid poller or gate settings.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("build id must not be empty")]
    EmptyBuildId,

    #[error("build API URL must be an absolute http(s) URL (got {0})")]
    InvalidEndpoint(String),

    #[error("API token must not be empty")]
    EmptyToken,

    #[error("max attempts must be at least 1")]
    ZeroAttempts,

    #[error("threshold must be a finite, non-negative percentage (got {0})")]
    InvalidThreshold(f64),

    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
}

/// Fatal outcomes of a gated run.
#[derive(Error, Debug)]
pub enum GateError {
    #[error(
        "build did not finish after {attempts} attempt(s) (last state: {})",
        .last_state.as_deref().unwrap_or("unknown")
    )]
    Timeout {
        attempts: u32,
        last_state: Option<String>,
    },

    #[error("could not fetch final metrics: {0}")]
    Fetch(#[from] FetchError),

    #[error(
        "changed comparisons {:.2}% exceed threshold {:.2}%",
        .verdict.percentage,
        .verdict.threshold
    )]
    ThresholdExceeded { verdict: Verdict },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Result alias for gate operations
pub type Result<T> = std::result::Result<T, GateError>;
