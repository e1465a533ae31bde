pub mod openai;
pub mod pipeline;
pub mod platform;
pub mod provider;
pub mod transcript;

pub use openai::OpenAiClient;
pub use pipeline::{MentionOutcome, MentionPipeline, PipelineError};
pub use platform::{PlatformError, ThreadPlatform};
pub use provider::{CompletionError, CompletionService, Model};
