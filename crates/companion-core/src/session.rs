//! Chat session controller
//!
//! Owns the transcript, the input buffer and the single in-flight request.
//! `submit` performs the optimistic half of an exchange synchronously and
//! hands the backend call to a tokio task; `settle` waits for that task and
//! appends the agent's side. Only one request may be outstanding at a time.

use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::JoinHandle;

use crate::ai::{ChatReply, MessagingClient};
use crate::state::{Message, Phase};

/// Result of asking the session to submit its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Sent,
    /// Blank input or a request already in flight. Nothing changed.
    Ignored,
}

/// How an in-flight request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Replied,
    Fallback,
}

pub struct Session {
    client: Arc<dyn MessagingClient>,
    messages: Vec<Message>,
    input: String,
    pending: bool,
    in_flight: Option<JoinHandle<anyhow::Result<ChatReply>>>,
}

impl Session {
    pub fn new(client: Arc<dyn MessagingClient>) -> Self {
        Self {
            client,
            messages: Vec::new(),
            input: String::new(),
            pending: false,
            in_flight: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn phase(&self) -> Phase {
        if self.pending {
            Phase::Awaiting
        } else {
            Phase::Idle
        }
    }

    /// True when the input could be sent right now.
    pub fn can_submit(&self) -> bool {
        !self.pending && !self.input.trim().is_empty()
    }

    /// Send the current input buffer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self) -> Submission {
        if !self.can_submit() {
            return Submission::Ignored;
        }

        let text = std::mem::take(&mut self.input);
        self.messages.push(Message::user(text.clone()));
        self.pending = true;

        tracing::debug!(chars = text.chars().count(), "dispatching message");
        let client = Arc::clone(&self.client);
        self.in_flight = Some(tokio::spawn(async move { client.send(&text).await }));

        Submission::Sent
    }

    /// Replace the input buffer with `text` and submit it.
    ///
    /// When the submission is ignored the buffer keeps `text`, just as if
    /// the user had typed it.
    pub fn submit_text(&mut self, text: impl Into<String>) -> Submission {
        if self.pending {
            return Submission::Ignored;
        }
        self.input = text.into();
        self.submit()
    }

    /// Wait for the in-flight request and append the agent's reply.
    ///
    /// Returns `None` immediately when nothing is in flight. Dropping the
    /// returned future early leaves the session untouched.
    pub async fn settle(&mut self) -> Option<Settlement> {
        let handle = self.in_flight.as_mut()?;
        let joined = handle.await;
        self.in_flight = None;

        let outcome = joined.unwrap_or_else(|e| Err(anyhow!("request task failed: {e}")));
        Some(self.resolve(outcome))
    }

    fn resolve(&mut self, outcome: anyhow::Result<ChatReply>) -> Settlement {
        let settlement = match outcome {
            Ok(reply) => {
                let message = Message::agent(reply.response, reply.sentiment, reply.safety);
                tracing::debug!(alert = message.is_safety_alert(), "reply received");
                self.messages.push(message);
                Settlement::Replied
            }
            Err(e) => {
                tracing::warn!(error = %e, "error sending message");
                self.messages.push(Message::fallback());
                Settlement::Fallback
            }
        };
        self.pending = false;
        settlement
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Role, FALLBACK_REPLY};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Replies with a fixed result and counts calls.
    struct ScriptedClient {
        reply: Option<ChatReply>,
        calls: AtomicUsize,
        seen: std::sync::Mutex<Vec<String>>,
    }

    impl ScriptedClient {
        fn replying(response: &str, sentiment: Option<&str>, safety: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(ChatReply {
                    response: response.to_string(),
                    sentiment: sentiment.map(str::to_string),
                    safety: safety.map(str::to_string),
                }),
                calls: AtomicUsize::new(0),
                seen: std::sync::Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                calls: AtomicUsize::new(0),
                seen: std::sync::Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl MessagingClient for ScriptedClient {
        async fn send(&self, message: &str) -> anyhow::Result<ChatReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(message.to_string());
            self.reply
                .clone()
                .ok_or_else(|| anyhow!("connection refused"))
        }
    }

    /// Never answers; records when its future is dropped.
    struct HangingClient {
        started: Notify,
        dropped: Arc<AtomicBool>,
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl MessagingClient for HangingClient {
        async fn send(&self, _message: &str) -> anyhow::Result<ChatReply> {
            let _flag = DropFlag(Arc::clone(&self.dropped));
            self.started.notify_one();
            std::future::pending::<()>().await;
            unreachable!()
        }
    }

    #[tokio::test]
    async fn test_submit_appends_user_message_and_sets_pending() {
        let client = ScriptedClient::replying("ok", None, None);
        let mut session = Session::new(client.clone());
        session.set_input("I feel anxious today");

        assert_eq!(session.submit(), Submission::Sent);

        assert_eq!(session.messages(), &[Message::user("I feel anxious today")]);
        assert_eq!(session.input(), "");
        assert!(session.is_pending());
        assert_eq!(session.phase(), Phase::Awaiting);
    }

    #[tokio::test]
    async fn test_successful_reply_is_appended() {
        // Scenario A
        let client = ScriptedClient::replying(
            "That sounds hard.",
            Some("Emotion: anxious"),
            Some("FALSE"),
        );
        let mut session = Session::new(client.clone());

        session.submit_text("I feel anxious today");
        assert_eq!(session.settle().await, Some(Settlement::Replied));

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Agent);
        assert_eq!(messages[1].content, "That sounds hard.");
        assert_eq!(messages[1].sentiment.as_deref(), Some("Emotion: anxious"));
        assert!(!messages[1].is_safety_alert());
        assert_eq!(messages[1].sentiment_label().as_deref(), Some("anxious"));
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_flagged_reply_keeps_safety_field() {
        // Scenario B
        let client = ScriptedClient::replying("...", None, Some("TRUE"));
        let mut session = Session::new(client);

        session.submit_text("I want to hurt myself");
        session.settle().await;

        let reply = session.messages().last().unwrap();
        assert!(reply.is_safety_alert());
        assert!(reply.sentiment.is_none());
    }

    #[tokio::test]
    async fn test_failure_appends_fallback() {
        // Scenario C
        let client = ScriptedClient::failing();
        let mut session = Session::new(client.clone());

        session.submit_text("hello");
        assert_eq!(session.settle().await, Some(Settlement::Fallback));

        let messages = session.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], Message::fallback());
        assert_eq!(messages[1].content, FALLBACK_REPLY);
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn test_blank_submit_is_noop() {
        // Scenario D
        let client = ScriptedClient::replying("ok", None, None);
        let mut session = Session::new(client.clone());
        session.set_input("   ");

        assert_eq!(session.submit(), Submission::Ignored);

        assert!(session.messages().is_empty());
        assert_eq!(session.input(), "   ");
        assert!(!session.is_pending());
        assert_eq!(session.settle().await, None);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submit_while_pending_is_ignored() {
        // Scenario E
        let client = ScriptedClient::replying("ok", None, None);
        let mut session = Session::new(client.clone());

        session.submit_text("first");
        session.set_input("second");
        assert_eq!(session.submit(), Submission::Ignored);
        assert_eq!(session.submit_text("third"), Submission::Ignored);

        assert_eq!(session.messages(), &[Message::user("first")]);
        assert_eq!(session.input(), "second");
        assert!(session.is_pending());

        session.settle().await;
        assert_eq!(session.messages().len(), 2);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_untrimmed_text_is_sent() {
        let client = ScriptedClient::replying("ok", None, None);
        let mut session = Session::new(client.clone());

        session.submit_text("  hello there ");
        session.settle().await;

        assert_eq!(session.messages()[0].content, "  hello there ");
        assert_eq!(client.seen.lock().unwrap().as_slice(), ["  hello there "]);
    }

    #[tokio::test]
    async fn test_resubmit_after_failure() {
        let client = ScriptedClient::failing();
        let mut session = Session::new(client.clone());

        session.submit_text("one");
        session.settle().await;
        assert_eq!(session.submit_text("two"), Submission::Sent);
        session.settle().await;

        let roles: Vec<Role> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Agent, Role::User, Role::Agent]);
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_settle_leaves_session_untouched() {
        let dropped = Arc::new(AtomicBool::new(false));
        let client = Arc::new(HangingClient {
            started: Notify::new(),
            dropped: dropped.clone(),
        });
        let mut session = Session::new(client.clone());
        session.submit_text("hello");

        let waited = tokio::time::timeout(Duration::from_millis(20), session.settle()).await;
        assert!(waited.is_err());
        assert_eq!(session.messages().len(), 1);
        assert!(session.is_pending());
        assert!(!dropped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_drop_aborts_in_flight_request() {
        let dropped = Arc::new(AtomicBool::new(false));
        let client = Arc::new(HangingClient {
            started: Notify::new(),
            dropped: dropped.clone(),
        });
        let mut session = Session::new(client.clone());
        session.submit_text("hello");
        client.started.notified().await;

        drop(session);

        for _ in 0..200 {
            if dropped.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(dropped.load(Ordering::SeqCst));
    }
}
