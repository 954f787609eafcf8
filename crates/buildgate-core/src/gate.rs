//! Comparison threshold gate.
//!
//! The gate fails when the share of changed comparisons, rounded to two
//! decimals, is strictly greater than the threshold. A build with no
//! finished comparisons passes with a warning.

use serde::{Deserialize, Serialize};

use crate::metrics::ComparisonMetrics;

/// Gate evaluation verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the gate passed.
    pub passed: bool,

    /// Changed comparisons as a percentage of finished ones (two decimals).
    pub percentage: f64,

    /// Threshold the percentage was compared against.
    pub threshold: f64,

    /// Human-readable explanation.
    pub reason: String,
}

/// Evaluate comparison metrics against a failure threshold in percent.
pub fn evaluate(metrics: &ComparisonMetrics, threshold_percent: f64) -> Verdict {
    if metrics.finished == 0 {
        return Verdict {
            passed: true,
            percentage: 0.0,
            threshold: threshold_percent,
            reason: "Warning: no finished comparisons, skipping threshold check".to_string(),
        };
    }

    let percentage = percentage_hundredths(metrics.diff, metrics.finished) as f64 / 100.0;
    let passed = percentage <= threshold_percent;

    let reason = if passed {
        format!(
            "{} of {} comparisons changed ({:.2}%), within threshold {:.2}%",
            metrics.diff, metrics.finished, percentage, threshold_percent
        )
    } else {
        format!(
            "{} of {} comparisons changed ({:.2}%), exceeds threshold {:.2}%",
            metrics.diff, metrics.finished, percentage, threshold_percent
        )
    };

    Verdict {
        passed,
        percentage,
        threshold: threshold_percent,
        reason,
    }
}

/// `diff / finished * 100` in hundredths of a percent, rounded half away
/// from zero. Requires `finished > 0`.
fn percentage_hundredths(diff: u64, finished: u64) -> u128 {
    let numerator = diff as u128 * 10_000;
    let denominator = finished as u128;
    (2 * numerator + denominator) / (2 * denominator)
}
