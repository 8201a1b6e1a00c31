//! Text generation boundary — the opaque, fallible LLM collaborator.
//!
//! Every agent in the committee talks to the model through the
//! [`TextGenerator`] trait, which keeps the debate engine testable with
//! scripted stubs and keeps transport failures typed at the boundary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::config::DEFAULT_TIMEOUT_SECS;

/// Errors from a generation call.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation request failed: {0}")]
    RequestFailed(String),

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation returned an empty response")]
    EmptyResponse,
}

/// An opaque async text generator: system prompt + user prompt → text.
///
/// Calls are network-bound and latency-variable; implementations must
/// enforce a bounded timeout.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, GenerateError>;
}

/// Enforces a per-call timeout around any [`TextGenerator`].
///
/// The orchestrator wraps its generator in one of these so the configured
/// debate timeout bounds every generation call, whatever the inner
/// implementation does about timeouts itself.
pub struct BoundedGenerator {
    inner: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl BoundedGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl TextGenerator for BoundedGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, GenerateError> {
        tokio::time::timeout(self.timeout, self.inner.generate(system_prompt, user_prompt))
            .await
            .map_err(|_| GenerateError::Timeout(self.timeout))?
    }
}

/// Anthropic Messages API implementation of [`TextGenerator`].
pub struct AnthropicGenerator {
    api_key: String,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl AnthropicGenerator {
    /// Create a generator for the given API key and model.
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_timeout(api_key, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a generator with an explicit per-call timeout.
    pub fn with_timeout(api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, GenerateError> {
        let request_body = serde_json::json!({
            "model": self.model,
            "max_tokens": 4096,
            "system": system_prompt,
            "messages": [{
                "role": "user",
                "content": user_prompt
            }]
        });

        let send = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request_body)
            .send();

        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| GenerateError::Timeout(self.timeout))?
            .map_err(|e| GenerateError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "generation request rejected");
            return Err(GenerateError::RequestFailed(format!(
                "API error ({}): {}",
                status, body
            )));
        }

        let resp_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GenerateError::RequestFailed(e.to_string()))?;

        let content = resp_json["content"][0]["text"]
            .as_str()
            .unwrap_or("")
            .to_string();

        if content.is_empty() {
            return Err(GenerateError::EmptyResponse);
        }

        Ok(content)
    }
}
