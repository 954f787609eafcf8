//! Build-status API client
//!
//! The poller and metrics fetcher only need "GET this URL with the auth
//! header and give me JSON", so the transport sits behind [`BuildApi`].

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use tracing::debug;

use crate::config::PollConfig;
use crate::error::ApiError;

/// Fetches a build resource as JSON.
#[async_trait]
pub trait BuildApi: Send + Sync {
    /// GET `url` and return the decoded JSON body.
    async fn fetch_build(&self, url: &str) -> Result<Value, ApiError>;
}

/// reqwest-backed client for the real service
pub struct HttpBuildApi {
    auth_header: String,
    http_client: reqwest::Client,
}

impl HttpBuildApi {
    /// Create a client using the token and request timeout from `config`.
    pub fn new(config: &PollConfig) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("buildgate/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()?;

        Ok(HttpBuildApi {
            auth_header: config.auth_header(),
            http_client,
        })
    }
}

#[async_trait]
impl BuildApi for HttpBuildApi {
    async fn fetch_build(&self, url: &str) -> Result<Value, ApiError> {
        debug!(url, "GET build resource");

        let response = self
            .http_client
            .get(url)
            .header(AUTHORIZATION, &self.auth_header)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
