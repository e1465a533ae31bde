//! Mention pipeline — shared by every ingress adapter.
//!
//! One invocation per qualifying mention event: fetch the thread history,
//! flatten it into a transcript, ask the completion service for a reply,
//! post the reply back into the same thread. The three network calls run
//! strictly in sequence; posting is gated on a successfully produced,
//! non-empty reply.

use std::sync::Arc;

use tracing::{debug, info};

use crate::platform::{PlatformError, ThreadPlatform};
use crate::provider::{
    ChatMessage, CompletionError, CompletionRequest, CompletionService, Model, SamplingOptions,
};
use crate::transcript::build_transcript;

/// How a mention invocation concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionOutcome {
    /// A reply was posted into the thread.
    Replied,
    /// The event had no thread anchor — nothing to reply to, nothing done.
    Ignored,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("platform call failed: {0}")]
    Platform(#[from] PlatformError),

    #[error("completion call failed: {0}")]
    Completion(#[from] CompletionError),

    /// The completion succeeded but yielded no usable text after trimming.
    #[error("completion yielded no usable reply text")]
    EmptyReply,
}

/// Orchestrates one mention → completion → reply exchange.
///
/// Holds shared, immutable-after-construction service handles injected at
/// process start, so tests can substitute fakes for both collaborators.
pub struct MentionPipeline {
    platform: Arc<dyn ThreadPlatform>,
    completions: Arc<dyn CompletionService>,
    model: Model,
    persona: String,
}

impl MentionPipeline {
    pub fn new(
        platform: Arc<dyn ThreadPlatform>,
        completions: Arc<dyn CompletionService>,
        model: Model,
        persona: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            completions,
            model,
            persona: persona.into(),
        }
    }

    /// Handle one mention event.
    ///
    /// `thread_ts == None` short-circuits to [`MentionOutcome::Ignored`]
    /// with zero outbound calls. Otherwise: exactly one history fetch, at
    /// most one completion call, at most one reply post. Failures propagate
    /// to the caller and are never followed by a post. Redelivery of the
    /// same event is a fresh invocation — no dedup.
    pub async fn handle_mention(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
    ) -> Result<MentionOutcome, PipelineError> {
        let Some(thread_ts) = thread_ts else {
            debug!(channel, "mention outside a thread, nothing to reply to");
            return Ok(MentionOutcome::Ignored);
        };

        // An empty history degrades to an empty transcript, not a failure.
        let history = self.platform.fetch_thread(channel, thread_ts).await?;
        let transcript = build_transcript(&history);
        debug!(channel, thread_ts, messages = history.len(), "built thread transcript");

        let request = CompletionRequest {
            model: self.model,
            messages: vec![
                ChatMessage::system(self.persona.clone()),
                ChatMessage::user(transcript),
            ],
            options: SamplingOptions::default(),
        };

        let response = self.completions.complete(&request).await?;

        let reply = response
            .choices
            .first()
            .map(|c| c.message.content.trim())
            .unwrap_or_default();
        if reply.is_empty() {
            return Err(PipelineError::EmptyReply);
        }

        self.platform.post_reply(channel, thread_ts, reply).await?;

        info!(
            channel,
            thread_ts,
            service = self.completions.name(),
            chars = reply.len(),
            "posted threaded reply"
        );
        Ok(MentionOutcome::Replied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{Choice, CompletionResponse, Role, Usage};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use threadrelay_core::ThreadMessage;

    const PERSONA: &str = "You are a helpful Slack bot.";

    struct FakePlatform {
        history: Vec<ThreadMessage>,
        fail_fetch: bool,
        fetches: Mutex<u32>,
        posts: Mutex<Vec<(String, String, String)>>,
    }

    impl FakePlatform {
        fn with_history(history: Vec<ThreadMessage>) -> Self {
            Self {
                history,
                fail_fetch: false,
                fetches: Mutex::new(0),
                posts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail_fetch: true,
                ..Self::with_history(Vec::new())
            }
        }

        fn fetch_count(&self) -> u32 {
            *self.fetches.lock().unwrap()
        }

        fn posts(&self) -> Vec<(String, String, String)> {
            self.posts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ThreadPlatform for FakePlatform {
        async fn fetch_thread(
            &self,
            _channel: &str,
            _thread_ts: &str,
        ) -> Result<Vec<ThreadMessage>, PlatformError> {
            *self.fetches.lock().unwrap() += 1;
            if self.fail_fetch {
                return Err(PlatformError::Api {
                    method: "conversations.replies".into(),
                    reason: "channel_not_found".into(),
                });
            }
            Ok(self.history.clone())
        }

        async fn post_reply(
            &self,
            channel: &str,
            thread_ts: &str,
            text: &str,
        ) -> Result<(), PlatformError> {
            self.posts.lock().unwrap().push((
                channel.to_string(),
                thread_ts.to_string(),
                text.to_string(),
            ));
            Ok(())
        }
    }

    enum Behavior {
        Reply(&'static str),
        RateLimited,
    }

    struct FakeCompletions {
        behavior: Behavior,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl FakeCompletions {
        fn replying(content: &'static str) -> Self {
            Self {
                behavior: Behavior::Reply(content),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn rate_limited() -> Self {
            Self {
                behavior: Behavior::RateLimited,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionService for FakeCompletions {
        fn name(&self) -> &str {
            "fake"
        }

        async fn complete(
            &self,
            req: &CompletionRequest,
        ) -> Result<CompletionResponse, CompletionError> {
            self.requests.lock().unwrap().push(req.clone());
            match self.behavior {
                Behavior::Reply(content) => Ok(response_with(content)),
                Behavior::RateLimited => Err(CompletionError::RateLimited {
                    retry_after_ms: 5000,
                    body: "{\"error\":\"rate_limit_exceeded\"}".into(),
                }),
            }
        }
    }

    fn response_with(content: &str) -> CompletionResponse {
        CompletionResponse {
            id: "chatcmpl-test".into(),
            object: "chat.completion".into(),
            created: 1_677_652_288,
            choices: vec![Choice {
                index: 0,
                message: ChatMessage {
                    role: Role::Assistant,
                    content: content.into(),
                },
                finish_reason: Some("stop".into()),
            }],
            usage: Some(Usage {
                prompt_tokens: 9,
                completion_tokens: 12,
                total_tokens: 21,
            }),
        }
    }

    fn pipeline(
        platform: Arc<FakePlatform>,
        completions: Arc<FakeCompletions>,
    ) -> MentionPipeline {
        MentionPipeline::new(platform, completions, Model::Gpt35Turbo, PERSONA)
    }

    #[tokio::test]
    async fn request_user_content_is_the_transcript() {
        let platform = Arc::new(FakePlatform::with_history(vec![ThreadMessage::new(
            "U1", "hi",
        )]));
        let completions = Arc::new(FakeCompletions::replying("Hello U1"));
        let p = pipeline(Arc::clone(&platform), Arc::clone(&completions));

        let outcome = p.handle_mention("C42", Some("1234.5678")).await.unwrap();
        assert_eq!(outcome, MentionOutcome::Replied);

        let requests = completions.requests();
        assert_eq!(requests.len(), 1);
        let messages = &requests[0].messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, PERSONA);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "U1: hi");
    }

    #[tokio::test]
    async fn posts_trimmed_reply_into_the_same_thread() {
        let platform = Arc::new(FakePlatform::with_history(vec![ThreadMessage::new(
            "U1", "hi",
        )]));
        let completions = Arc::new(FakeCompletions::replying("  Hello there  "));
        let p = pipeline(Arc::clone(&platform), completions);

        p.handle_mention("C42", Some("1234.5678")).await.unwrap();

        let posts = platform.posts();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "C42");
        assert_eq!(posts[0].1, "1234.5678");
        assert_eq!(posts[0].2, "Hello there");
    }

    #[tokio::test]
    async fn empty_history_still_issues_a_completion() {
        let platform = Arc::new(FakePlatform::with_history(Vec::new()));
        let completions = Arc::new(FakeCompletions::replying("Anyone there?"));
        let p = pipeline(Arc::clone(&platform), Arc::clone(&completions));

        let outcome = p.handle_mention("C42", Some("1234.5678")).await.unwrap();
        assert_eq!(outcome, MentionOutcome::Replied);

        let requests = completions.requests();
        assert_eq!(requests[0].messages[1].content, "");
        assert_eq!(platform.posts().len(), 1);
    }

    #[tokio::test]
    async fn rate_limited_completion_surfaces_and_skips_post() {
        let platform = Arc::new(FakePlatform::with_history(vec![ThreadMessage::new(
            "U1", "hi",
        )]));
        let completions = Arc::new(FakeCompletions::rate_limited());
        let p = pipeline(Arc::clone(&platform), completions);

        let err = p.handle_mention("C42", Some("1234.5678")).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Completion(CompletionError::RateLimited { .. })
        ));
        assert!(platform.posts().is_empty());
    }

    #[tokio::test]
    async fn blank_reply_is_an_error_and_nothing_is_posted() {
        let platform = Arc::new(FakePlatform::with_history(vec![ThreadMessage::new(
            "U1", "hi",
        )]));
        let completions = Arc::new(FakeCompletions::replying("   "));
        let p = pipeline(Arc::clone(&platform), completions);

        let err = p.handle_mention("C42", Some("1234.5678")).await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyReply));
        assert!(platform.posts().is_empty());
    }

    #[tokio::test]
    async fn unthreaded_mention_makes_zero_outbound_calls() {
        let platform = Arc::new(FakePlatform::with_history(vec![ThreadMessage::new(
            "U1", "hi",
        )]));
        let completions = Arc::new(FakeCompletions::replying("unused"));
        let p = pipeline(Arc::clone(&platform), Arc::clone(&completions));

        let outcome = p.handle_mention("C42", None).await.unwrap();
        assert_eq!(outcome, MentionOutcome::Ignored);
        assert_eq!(platform.fetch_count(), 0);
        assert!(completions.requests().is_empty());
        assert!(platform.posts().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_propagates_before_any_completion() {
        let platform = Arc::new(FakePlatform::failing());
        let completions = Arc::new(FakeCompletions::replying("unused"));
        let p = pipeline(Arc::clone(&platform), Arc::clone(&completions));

        let err = p.handle_mention("C42", Some("1234.5678")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Platform(PlatformError::Api { .. })));
        assert!(completions.requests().is_empty());
        assert!(platform.posts().is_empty());
    }

    #[tokio::test]
    async fn redelivery_posts_twice_without_dedup() {
        let platform = Arc::new(FakePlatform::with_history(vec![ThreadMessage::new(
            "U1", "hi",
        )]));
        let completions = Arc::new(FakeCompletions::replying("Hello"));
        let p = pipeline(Arc::clone(&platform), completions);

        p.handle_mention("C42", Some("1234.5678")).await.unwrap();
        p.handle_mention("C42", Some("1234.5678")).await.unwrap();

        assert_eq!(platform.fetch_count(), 2);
        assert_eq!(platform.posts().len(), 2);
    }
}
