pub mod client;
pub mod events;
pub mod signature;

pub use client::SlackClient;
pub use events::{EventEnvelope, MentionEvent};
pub use signature::{verify_signature, SignatureError};
