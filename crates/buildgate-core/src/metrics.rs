//! Final comparison metrics for a finished build.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::client::BuildApi;
use crate::config::PollConfig;
use crate::error::FetchError;

pub const DIFF_FIELD: &str = "total-comparisons-diff";
pub const FINISHED_FIELD: &str = "total-comparisons-finished";

/// Comparison totals of a finished build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonMetrics {
    /// Comparisons flagged as changed
    pub diff: u64,
    /// Comparisons completed
    pub finished: u64,
}

/// Fetch the build resource once and extract its comparison totals.
///
/// Not retried: a transport failure or an invalid field ends the run.
pub async fn fetch_metrics(
    api: &dyn BuildApi,
    config: &PollConfig,
) -> Result<ComparisonMetrics, FetchError> {
    let body = api.fetch_build(&config.endpoint).await?;
    let metrics = parse_metrics(&body)?;

    info!(
        diff = metrics.diff,
        finished = metrics.finished,
        "Fetched comparison metrics"
    );
    Ok(metrics)
}

/// Extract both totals from `data.attributes`.
pub fn parse_metrics(body: &Value) -> Result<ComparisonMetrics, FetchError> {
    let attributes = &body["data"]["attributes"];
    Ok(ComparisonMetrics {
        diff: count_field(attributes, DIFF_FIELD)?,
        finished: count_field(attributes, FINISHED_FIELD)?,
    })
}

/// A count may arrive as a JSON integer or as a string of digits.
fn count_field(attributes: &Value, field: &str) -> Result<u64, FetchError> {
    let value = &attributes[field];
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                s.parse().ok()
            } else {
                None
            }
        }
        _ => None,
    };

    parsed.ok_or_else(|| FetchError::InvalidMetrics {
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::metrics_body;
    use serde_json::json;

    #[test]
    fn test_numbers_and_numeric_strings() {
        let metrics = parse_metrics(&metrics_body(json!(3), json!("120"))).unwrap();
        assert_eq!(
            metrics,
            ComparisonMetrics {
                diff: 3,
                finished: 120
            }
        );
    }

    #[test]
    fn test_non_numeric_diff_is_invalid() {
        let err = parse_metrics(&metrics_body(json!("abc"), json!(10))).unwrap_err();
        match err {
            FetchError::InvalidMetrics { field, value } => {
                assert_eq!(field, DIFF_FIELD);
                assert_eq!(value, "\"abc\"");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_negative_fractional_and_missing() {
        for (diff, finished) in [
            (json!(-1), json!(10)),
            (json!("-1"), json!(10)),
            (json!(1.5), json!(10)),
            (json!("1.5"), json!(10)),
            (json!(""), json!(10)),
            (json!(null), json!(10)),
            (json!(1), json!(true)),
        ] {
            assert!(
                matches!(
                    parse_metrics(&metrics_body(diff.clone(), finished.clone())),
                    Err(FetchError::InvalidMetrics { .. })
                ),
                "expected invalid for diff={diff} finished={finished}"
            );
        }
    }

    #[test]
    fn test_missing_attributes() {
        let err = parse_metrics(&json!({ "data": {} })).unwrap_err();
        assert!(matches!(err, FetchError::InvalidMetrics { field, .. } if field == DIFF_FIELD));
    }
}
