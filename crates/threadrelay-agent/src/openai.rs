use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use threadrelay_core::config::COMPLETION_TIMEOUT_SECS;

use crate::provider::{
    CompletionError, CompletionRequest, CompletionResponse, CompletionService,
};

/// Typed client for an OpenAI-compatible chat-completions endpoint.
///
/// Holds one shared `reqwest::Client` (internally pooled, safe to use from
/// concurrent invocations). Performs a single outbound call per request —
/// no retries, no streaming consumption.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com".to_string()),
        }
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        req: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        debug!(model = %req.model, "sending completion request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .timeout(Duration::from_secs(COMPLETION_TIMEOUT_SECS))
            .json(req)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status == 429 {
            let retry = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|s| s * 1000) // convert seconds to ms
                .unwrap_or(5000);
            let body = resp.text().await.unwrap_or_default();
            warn!(retry_after_ms = retry, "completion API throttled the request");
            return Err(CompletionError::RateLimited {
                retry_after_ms: retry,
                body,
            });
        }

        if !resp.status().is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status, body = %body, "completion API error");
            return Err(match status {
                401 | 403 => CompletionError::Authentication { status, body },
                400 | 404 | 422 => CompletionError::InvalidRequest { status, body },
                _ => CompletionError::Upstream { status, body },
            });
        }

        let api_resp: CompletionResponse = resp.json().await?;

        if api_resp.choices.is_empty() {
            warn!(id = %api_resp.id, "completion response carried zero choices");
            return Err(CompletionError::NoChoices);
        }

        Ok(api_resp)
    }
}
