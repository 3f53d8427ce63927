use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Duration;

use crate::config::ModelConfigStore;

use super::types::ChatMessage;

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// The one error kind every model-service failure collapses into. Callers
/// either recover with a documented fallback or surface it as-is; there are
/// no retries.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model service is not configured: {0}")]
    Config(String),
    #[error("model service request failed: {0}")]
    Transport(String),
    #[error("unexpected model service response: {0}")]
    ResponseShape(String),
}

#[async_trait]
pub trait ModelService: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_output_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError>;
}

/// OpenAI-compatible chat-completions client. One POST per call, bearer
/// auth, generous fixed timeout.
pub struct HttpModelClient {
    http: reqwest::Client,
    config: Arc<ModelConfigStore>,
}

impl HttpModelClient {
    pub fn new(config: Arc<ModelConfigStore>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|err| anyhow::anyhow!("failed to build HTTP client: {err}"))?;

        Ok(Self { http, config })
    }
}

#[async_trait]
impl ModelService for HttpModelClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_output_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let cfg = self.config.current();
        if cfg.api_key.is_empty() {
            return Err(LlmError::Config(
                "model service API key is not set".to_string(),
            ));
        }

        let url = format!("{}/v1/chat/completions", cfg.base_url.trim_end_matches('/'));
        let payload = serde_json::json!({
            "model": cfg.model,
            "messages": messages,
            "max_tokens": max_output_tokens,
            "temperature": temperature,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&cfg.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| LlmError::Transport(format!("request to {url} failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Transport(format!(
                "model service returned {status}: {}",
                snippet(&body)
            )));
        }

        let envelope: serde_json::Value = response
            .json()
            .await
            .map_err(|err| LlmError::ResponseShape(format!("response body was not JSON: {err}")))?;

        envelope
            .pointer("/choices/0/message/content")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                LlmError::ResponseShape(format!(
                    "missing choices[0].message.content in {}",
                    snippet(&envelope.to_string())
                ))
            })
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(2000).collect()
}
