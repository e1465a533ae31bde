use serde::{Deserialize, Serialize};

/// One historical message in a conversation thread, as returned by the
/// chat platform. Lives only for the duration of a single pipeline
/// invocation — never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    /// Author identifier (platform user ID).
    pub user: String,
    /// Message text. May be empty; a missing field deserializes to `""`.
    #[serde(default)]
    pub text: String,
}

impl ThreadMessage {
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
        }
    }
}
