use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, warn};

use notify_relay_core::config::CompletionConfig;
use notify_relay_core::error::RelayError;

use crate::provider::{CompletionProvider, CompletionRequest, CompletionResult, ProviderError};

/// Chat-completions endpoint reached over HTTP(S) with a bearer credential.
pub struct HttpCompletionProvider {
    client: reqwest::Client,
    api_key: String,
    url: String,
    connect_timeout_ms: u64,
    request_timeout_ms: u64,
}

impl HttpCompletionProvider {
    /// Build from config. Fails when the credential is missing or the HTTP
    /// client cannot be constructed.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, RelayError> {
        let api_key = config.credential()?.to_string();
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RelayError::Config(format!("http client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            url: config.url.clone(),
            connect_timeout_ms: config.connect_timeout_secs.saturating_mul(1000),
            request_timeout_ms: config.request_timeout_secs.saturating_mul(1000),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn classify(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            self.timed_out(e.is_connect())
        } else {
            ProviderError::Http(e)
        }
    }

    /// A timeout during connection setup reports the connect limit, anything
    /// later the whole-request limit.
    fn timed_out(&self, connecting: bool) -> ProviderError {
        if connecting {
            ProviderError::Timeout {
                stage: "connect",
                ms: self.connect_timeout_ms,
            }
        } else {
            ProviderError::Timeout {
                stage: "request",
                ms: self.request_timeout_ms,
            }
        }
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    fn name(&self) -> &str {
        "http"
    }

    async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResult, ProviderError> {
        debug!(model = %req.model, url = %self.url, "sending completion request");

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(req)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = resp.status().as_u16();
        let success = resp.status().is_success();
        let body = resp.text().await.map_err(|e| self.classify(e))?;

        if !success {
            warn!(status, body = %body, "completion endpoint error");
            return Err(ProviderError::Api {
                status,
                message: body,
            });
        }

        if body.trim().is_empty() {
            warn!(status, "completion endpoint returned an empty body");
            return Err(ProviderError::EmptyBody { status });
        }

        Ok(CompletionResult { status, body })
    }
}
