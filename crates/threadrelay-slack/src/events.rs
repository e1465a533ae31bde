//! Inbound Events API wire types.
//!
//! Slack posts one JSON envelope per delivery. Two kinds matter here:
//! the one-time subscription handshake
//! `{ "type": "url_verification", "challenge": "..." }` and
//! `{ "type": "event_callback", "event": {...}, "event_id": "Ev..." }`
//! whose inner event may be an `app_mention`.

use serde::Deserialize;
use serde_json::Value;

/// Outer envelope of an Events API delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub challenge: Option<String>,
    /// Inner event, kept opaque — non-mention event shapes vary and are
    /// none of this service's business.
    #[serde(default)]
    pub event: Option<Value>,
    #[serde(default)]
    pub event_id: Option<String>,
}

impl EventEnvelope {
    pub fn is_url_verification(&self) -> bool {
        self.kind == "url_verification"
    }

    /// The inner `app_mention` event, when this envelope carries one.
    /// Any other delivery (different callback type, different inner event,
    /// undecodable shape) yields `None`.
    pub fn mention(&self) -> Option<MentionEvent> {
        if self.kind != "event_callback" {
            return None;
        }
        let event = self.event.as_ref()?;
        if event.get("type")?.as_str()? != "app_mention" {
            return None;
        }
        serde_json::from_value(event.clone()).ok()
    }
}

/// An `app_mention` event — the bot's handle was referenced in a message.
#[derive(Debug, Clone, Deserialize)]
pub struct MentionEvent {
    pub channel: String,
    /// Timestamp identifier of the mentioning message itself.
    pub ts: String,
    /// Thread anchor. Present only when the mention happened inside an
    /// existing thread; absent for top-level mentions.
    #[serde(default)]
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub bot_id: Option<String>,
}

impl MentionEvent {
    /// True when the mention was authored by a bot (including this one).
    pub fn from_bot(&self) -> bool {
        self.bot_id.is_some()
    }
}
