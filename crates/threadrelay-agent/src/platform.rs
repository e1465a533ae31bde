use async_trait::async_trait;

use threadrelay_core::ThreadMessage;

/// Interface to the chat platform hosting the conversation.
///
/// Implementations must be `Send + Sync` so a single shared client can
/// serve concurrent invocations, and take `&self` so sending never needs
/// a mutable borrow.
#[async_trait]
pub trait ThreadPlatform: Send + Sync {
    /// Fetch the ordered message history of the thread rooted at
    /// `thread_ts` in `channel`. Zero messages is a valid result.
    async fn fetch_thread(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> Result<Vec<ThreadMessage>, PlatformError>;

    /// Post `text` into `channel` as a threaded reply anchored at
    /// `thread_ts`. Fire-and-confirm.
    async fn post_reply(
        &self,
        channel: &str,
        thread_ts: &str,
        text: &str,
    ) -> Result<(), PlatformError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The platform answered but rejected the call.
    #[error("platform rejected {method}: {reason}")]
    Api { method: String, reason: String },

    /// The platform rejected the credential.
    #[error("platform credential rejected: {reason}")]
    Auth { reason: String },
}
