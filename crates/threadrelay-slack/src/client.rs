//! Typed Slack Web API client — the concrete [`ThreadPlatform`].
//!
//! Two operations only: `conversations.replies` for thread history and
//! `chat.postMessage` for the threaded reply. Slack answers HTTP 200 with
//! `{"ok": false, "error": "..."}` on most failures, so the error mapping
//! happens on the decoded body, not the status code.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use threadrelay_agent::platform::{PlatformError, ThreadPlatform};
use threadrelay_core::ThreadMessage;

/// Error codes Slack uses when the bot credential itself is the problem.
const AUTH_ERROR_CODES: &[&str] = &[
    "invalid_auth",
    "not_authed",
    "account_inactive",
    "token_revoked",
];

pub struct SlackClient {
    client: reqwest::Client,
    bot_token: String,
    base_url: String,
}

impl SlackClient {
    pub fn new(bot_token: String, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            bot_token,
            base_url: base_url.unwrap_or_else(|| "https://slack.com/api".to_string()),
        }
    }
}

#[async_trait]
impl ThreadPlatform for SlackClient {
    async fn fetch_thread(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> Result<Vec<ThreadMessage>, PlatformError> {
        let url = format!("{}/conversations.replies", self.base_url);

        debug!(channel, thread_ts, "fetching thread history");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.bot_token)
            .query(&[("channel", channel), ("ts", thread_ts)])
            .send()
            .await?;

        let body: RepliesResponse = resp.json().await?;
        messages_from(body)
    }

    async fn post_reply(
        &self,
        channel: &str,
        thread_ts: &str,
        text: &str,
    ) -> Result<(), PlatformError> {
        let url = format!("{}/chat.postMessage", self.base_url);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.bot_token)
            .json(&serde_json::json!({
                "channel": channel,
                "thread_ts": thread_ts,
                "text": text,
            }))
            .send()
            .await?;

        let ack: ApiAck = resp.json().await?;
        if !ack.ok {
            return Err(api_error("chat.postMessage", ack.error));
        }

        debug!(channel, thread_ts, "threaded reply delivered");
        Ok(())
    }
}

fn messages_from(body: RepliesResponse) -> Result<Vec<ThreadMessage>, PlatformError> {
    if !body.ok {
        return Err(api_error("conversations.replies", body.error));
    }
    Ok(body
        .messages
        .unwrap_or_default()
        .into_iter()
        .map(RawMessage::into_thread_message)
        .collect())
}

fn api_error(method: &str, code: Option<String>) -> PlatformError {
    let reason = code.unwrap_or_else(|| "unknown_error".to_string());
    warn!(method, reason = %reason, "Slack API call rejected");
    if AUTH_ERROR_CODES.contains(&reason.as_str()) {
        PlatformError::Auth { reason }
    } else {
        PlatformError::Api {
            method: method.to_string(),
            reason,
        }
    }
}

// Slack API response types (deserialization only)

#[derive(Deserialize)]
struct RepliesResponse {
    ok: bool,
    #[serde(default)]
    messages: Option<Vec<RawMessage>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct RawMessage {
    user: Option<String>,
    bot_id: Option<String>,
    text: Option<String>,
}

impl RawMessage {
    /// Bot-authored messages carry `bot_id` instead of `user`; either way
    /// the author identifier must never be absent downstream.
    fn into_thread_message(self) -> ThreadMessage {
        ThreadMessage {
            user: self.user.or(self.bot_id).unwrap_or_default(),
            text: self.text.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct ApiAck {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}
