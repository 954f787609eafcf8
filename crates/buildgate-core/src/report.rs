//! JSON report of a gated run, for CI artifacts.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GateError;
use crate::gate::Verdict;

/// Overall result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Passed,
    Failed,
    TimedOut,
    Error,
}

/// Serializable summary of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateReport {
    pub status: RunStatus,
    /// Present whenever metrics were evaluated
    pub verdict: Option<Verdict>,
    pub message: String,
    pub evaluated_at: DateTime<Utc>,
}

impl GateReport {
    /// Build a report from the outcome of [`crate::run_gate`].
    pub fn from_outcome(outcome: &Result<Verdict, GateError>) -> Self {
        let (status, verdict, message) = match outcome {
            Ok(verdict) => (RunStatus::Passed, Some(verdict.clone()), verdict.reason.clone()),
            Err(GateError::ThresholdExceeded { verdict }) => (
                RunStatus::Failed,
                Some(verdict.clone()),
                verdict.reason.clone(),
            ),
            Err(e @ GateError::Timeout { .. }) => (RunStatus::TimedOut, None, e.to_string()),
            Err(e) => (RunStatus::Error, None, e.to_string()),
        };

        GateReport {
            status,
            verdict,
            message,
            evaluated_at: Utc::now(),
        }
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::evaluate;
    use crate::metrics::ComparisonMetrics;
    use tempfile::tempdir;

    #[test]
    fn test_report_statuses() {
        let passing = evaluate(&ComparisonMetrics { diff: 1, finished: 10 }, 50.0);
        let failing = evaluate(&ComparisonMetrics { diff: 9, finished: 10 }, 50.0);

        let report = GateReport::from_outcome(&Ok(passing));
        assert_eq!(report.status, RunStatus::Passed);
        assert!(report.verdict.is_some());

        let report =
            GateReport::from_outcome(&Err(GateError::ThresholdExceeded { verdict: failing }));
        assert_eq!(report.status, RunStatus::Failed);
        assert_eq!(report.verdict.unwrap().percentage, 90.0);

        let report = GateReport::from_outcome(&Err(GateError::Timeout {
            attempts: 60,
            last_state: Some("pending".to_string()),
        }));
        assert_eq!(report.status, RunStatus::TimedOut);
        assert!(report.verdict.is_none());
        assert!(report.message.contains("60 attempt"));
    }

    #[test]
    fn test_write_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gate.json");
        let verdict = evaluate(&ComparisonMetrics { diff: 0, finished: 0 }, 50.0);

        GateReport::from_outcome(&Ok(verdict))
            .write_json(&path)
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["status"], "passed");
        assert_eq!(written["verdict"]["passed"], true);
        assert!(written["evaluated_at"].is_string());
    }
}
