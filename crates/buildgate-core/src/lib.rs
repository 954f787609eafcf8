//! buildgate core library
//!
//! Watches a visual-regression build until the service reports it
//! finished, then gates on the share of changed comparisons:
//!
//! - [`poller`]: bounded polling over the [`status::PollState`] machine
//! - [`metrics`]: one-shot fetch and validation of comparison totals
//! - [`gate`]: threshold evaluation producing a [`Verdict`]
//! - [`run`]: the three composed into a single gated run
//! - [`report`]: JSON summary of a run for CI artifacts

pub mod client;
pub mod config;
pub mod error;
pub mod fakes;
pub mod gate;
pub mod metrics;
pub mod poller;
pub mod report;
pub mod run;
pub mod status;
pub mod telemetry;

pub use client::{BuildApi, HttpBuildApi};
pub use config::PollConfig;
pub use error::{ApiError, ConfigError, FetchError, GateError, Result, TransientPollError};
pub use gate::{evaluate, Verdict};
pub use metrics::{fetch_metrics, ComparisonMetrics};
pub use poller::{poll, PollOutcome};
pub use report::{GateReport, RunStatus};
pub use run::run_gate;
pub use status::{BuildStatus, PollState};
pub use telemetry::init_tracing;
