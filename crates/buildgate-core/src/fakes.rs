//! In-memory fake of the build API (testing only)
//!
//! [`ScriptedBuildApi`] replays a fixed queue of responses, one per request,
//! and records every URL it was asked for.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::client::BuildApi;
use crate::error::ApiError;

/// Build API that answers from a pre-recorded script.
#[derive(Debug, Default)]
pub struct ScriptedBuildApi {
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedBuildApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful JSON response.
    pub fn respond(self, body: Value) -> Self {
        self.push(Ok(body))
    }

    /// Queue a transport failure.
    pub fn fail(self, message: &str) -> Self {
        self.push(Err(ApiError::Http(message.to_string())))
    }

    /// Queue `count` responses reporting `state`.
    pub fn states(self, state: &str, count: usize) -> Self {
        (0..count).fold(self, |api, _| api.respond(status_body(state)))
    }

    fn push(self, response: Result<Value, ApiError>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Number of requests served so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// URLs requested, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildApi for ScriptedBuildApi {
    async fn fetch_build(&self, url: &str) -> Result<Value, ApiError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Http("script exhausted".to_string())))
    }
}

/// Build resource body carrying only a state.
pub fn status_body(state: &str) -> Value {
    json!({ "data": { "attributes": { "state": state } } })
}

/// Finished build resource carrying comparison totals.
pub fn metrics_body(diff: Value, finished: Value) -> Value {
    json!({
        "data": {
            "attributes": {
                "state": "finished",
                "total-comparisons-diff": diff,
                "total-comparisons-finished": finished,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order_then_exhausts() {
        let api = ScriptedBuildApi::new()
            .respond(status_body("pending"))
            .fail("boom");

        let first = api.fetch_build("u1").await.unwrap();
        assert_eq!(first["data"]["attributes"]["state"], "pending");
        assert!(api.fetch_build("u2").await.is_err());
        assert!(matches!(
            api.fetch_build("u3").await,
            Err(ApiError::Http(msg)) if msg == "script exhausted"
        ));
        assert_eq!(api.requests(), vec!["u1", "u2", "u3"]);
    }
}
