//! Poller and gate configuration
//!
//! A [`PollConfig`] is built once (from flags or environment) and never
//! mutated afterwards; every component borrows it.

use std::fmt;
use std::time::Duration;

use reqwest::Url;

use crate::error::ConfigError;

/// Default build-status API base URL
pub const DEFAULT_API_BASE: &str = "https://percy.io/api/v1";
/// Default wait between poll attempts, in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 10;
/// Default attempt budget
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;
/// Default failure threshold, percent of changed comparisons
pub const DEFAULT_THRESHOLD_PERCENT: f64 = 50.0;
/// Default per-request HTTP timeout, in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const ENV_BUILD_ID: &str = "PERCY_BUILD_ID";
pub const ENV_TOKEN: &str = "PERCY_TOKEN";
pub const ENV_API_BASE: &str = "PERCY_API_BASE";

/// Settings for one gated run.
#[derive(Clone, PartialEq)]
pub struct PollConfig {
    /// Build identifier, trimmed
    pub build_id: String,
    /// Build-status resource, `{base}/builds/{id}` with the id percent-encoded
    pub endpoint: String,
    /// API token sent as `Authorization: Token token=...`
    pub token: String,
    /// Wait between attempts
    pub interval: Duration,
    /// Maximum number of status requests
    pub max_attempts: u32,
    /// Highest passing percentage of changed comparisons
    pub threshold_percent: f64,
    /// Timeout applied to each HTTP request
    pub request_timeout: Duration,
}

impl PollConfig {
    /// Create a config for `build_id` with default timings and threshold.
    pub fn new(api_base: &str, build_id: &str, token: &str) -> Self {
        let build_id = build_id.trim();
        PollConfig {
            build_id: build_id.to_string(),
            endpoint: build_endpoint(api_base, build_id),
            token: token.to_string(),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            threshold_percent: DEFAULT_THRESHOLD_PERCENT,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Read build id, token and optional API base from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let build_id =
            std::env::var(ENV_BUILD_ID).map_err(|_| ConfigError::MissingEnv(ENV_BUILD_ID))?;
        let token = std::env::var(ENV_TOKEN).map_err(|_| ConfigError::MissingEnv(ENV_TOKEN))?;
        let api_base =
            std::env::var(ENV_API_BASE).unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        let config = Self::new(&api_base, &build_id, &token);
        config.validate()?;
        Ok(config)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_threshold(mut self, threshold_percent: f64) -> Self {
        self.threshold_percent = threshold_percent;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Check the settings before any request is made.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.build_id.is_empty() {
            return Err(ConfigError::EmptyBuildId);
        }
        match Url::parse(&self.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(ConfigError::InvalidEndpoint(self.endpoint.clone())),
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        validate_threshold(self.threshold_percent)
    }

    /// Value of the `Authorization` header.
    pub fn auth_header(&self) -> String {
        format!("Token token={}", self.token)
    }
}

// The token never shows up in logs.
impl fmt::Debug for PollConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollConfig")
            .field("build_id", &self.build_id)
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("interval", &self.interval)
            .field("max_attempts", &self.max_attempts)
            .field("threshold_percent", &self.threshold_percent)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// A threshold must be a finite, non-negative percentage.
pub fn validate_threshold(threshold_percent: f64) -> Result<(), ConfigError> {
    if threshold_percent.is_finite() && threshold_percent >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold(threshold_percent))
    }
}

/// Append `builds/{id}` to the base path, percent-encoding the id.
///
/// A base that is not an absolute URL is joined textually and rejected
/// later by [`PollConfig::validate`].
fn build_endpoint(api_base: &str, build_id: &str) -> String {
    match Url::parse(api_base) {
        Ok(mut url) if !url.cannot_be_a_base() => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty().push("builds").push(build_id);
            }
            url.into()
        }
        _ => format!("{}/builds/{}", api_base.trim_end_matches('/'), build_id),
    }
}
