//! Slack Events API ingress — POST /slack/events.
//!
//! The invocation adapter: verifies the request signature, answers the
//! subscription handshake, and bridges one `app_mention` callback into the
//! mention pipeline. Returns 200 + ack on success, 401 on a bad signature,
//! 400 on an undecodable body. Holds no business logic.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

use threadrelay_slack::events::EventEnvelope;
use threadrelay_slack::signature;

use crate::app::AppState;

pub async fn events_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let timestamp = header_str(&headers, "x-slack-request-timestamp");
    let sig = header_str(&headers, "x-slack-signature");
    let now = chrono::Utc::now().timestamp();

    signature::verify_signature(
        &state.config.slack.signing_secret,
        timestamp,
        sig,
        &body,
        now,
    )
    .map_err(|e| {
        warn!(reason = %e, "event request failed signature verification");
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid signature"})),
        )
    })?;

    let envelope: EventEnvelope = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "invalid JSON in event body");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid JSON body"})),
        )
    })?;

    // One-time Events API subscription handshake.
    if envelope.is_url_verification() {
        let challenge = envelope.challenge.clone().unwrap_or_default();
        return Ok(Json(json!({"challenge": challenge})));
    }

    let receipt_id = uuid::Uuid::new_v4().to_string();

    let Some(mention) = envelope.mention() else {
        debug!(kind = %envelope.kind, receipt_id = %receipt_id, "event outside scope, acked and ignored");
        return Ok(Json(json!({"ok": true})));
    };

    // Never answer bot-authored mentions; replying to our own reply loops.
    if mention.from_bot() {
        debug!(channel = %mention.channel, receipt_id = %receipt_id, "bot-authored mention ignored");
        return Ok(Json(json!({"ok": true})));
    }

    info!(
        channel = %mention.channel,
        thread_ts = mention.thread_ts.as_deref().unwrap_or("-"),
        receipt_id = %receipt_id,
        "mention event accepted"
    );

    // A failed invocation means silence in the thread. The event is acked
    // either way; Slack redelivers on non-2xx and redeliveries are not
    // deduplicated.
    match state
        .pipeline
        .handle_mention(&mention.channel, mention.thread_ts.as_deref())
        .await
    {
        Ok(outcome) => {
            debug!(?outcome, receipt_id = %receipt_id, "mention handled");
        }
        Err(e) => {
            warn!(error = %e, receipt_id = %receipt_id, "mention pipeline failed, no reply posted");
        }
    }

    Ok(Json(json!({"ok": true})))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
