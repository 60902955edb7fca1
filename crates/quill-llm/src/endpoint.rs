//! Shared HTTP plumbing for the Ollama REST API.
//!
//! Both the generation client and the embedding service post JSON to the same
//! server, so connection setup and error classification live here.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use quill_core::config::ModelConfig;
use quill_core::error::QuillError;

/// Error body returned by Ollama on non-2xx responses.
#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

/// A configured connection to one Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaEndpoint {
    base_url: String,
    http: Client,
    request_timeout: Duration,
}

impl OllamaEndpoint {
    /// Build an endpoint with explicit timeouts.
    pub fn new(
        base_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, QuillError> {
        let http = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| QuillError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            request_timeout,
        })
    }

    /// Build an endpoint from the `[model]` configuration section.
    pub fn from_config(config: &ModelConfig) -> Result<Self, QuillError> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// POST `body` as JSON to `path` and decode the JSON response.
    pub async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, QuillError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST to model server");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            let message = serde_json::from_str::<OllamaErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(QuillError::Generation(format!(
                "{} returned {}: {}",
                path, status, message
            )));
        }

        response.json::<R>().await.map_err(|e| self.classify(e))
    }

    /// Map a transport error onto the failure taxonomy.
    ///
    /// Connection failures take precedence over timeouts so that a connect
    /// timeout reads as an unreachable server.
    fn classify(&self, err: reqwest::Error) -> QuillError {
        if err.is_connect() {
            QuillError::EndpointUnavailable(format!("{}: {}", self.base_url, err))
        } else if err.is_timeout() {
            QuillError::GenerationTimeout(self.request_timeout.as_secs())
        } else if err.is_decode() {
            QuillError::Generation(format!("invalid response body: {}", err))
        } else {
            QuillError::EndpointUnavailable(format!("{}: {}", self.base_url, err))
        }
    }
}
