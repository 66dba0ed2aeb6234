//! UI-agnostic conversation types
//!
//! These are shared by every front end (terminal UI, one-shot CLI) and don't
//! depend on any UI framework.

use serde::{Deserialize, Serialize};

/// Marker the backend puts in the safety classification when it escalates.
pub const SAFETY_ALERT_MARKER: &str = "TRUE";

const SENTIMENT_PREFIX: &str = "Emotion: ";

/// Shown in place of a reply whenever the backend can't be reached.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I'm having trouble connecting right now. Please try again in a moment.";

/// A message in the conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety: Option<String>,
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// Whether the session is waiting on the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Awaiting,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            sentiment: None,
            safety: None,
        }
    }

    pub fn agent(
        content: impl Into<String>,
        sentiment: Option<String>,
        safety: Option<String>,
    ) -> Self {
        Self {
            role: Role::Agent,
            content: content.into(),
            sentiment,
            safety,
        }
    }

    pub fn fallback() -> Self {
        Self::agent(FALLBACK_REPLY, None, None)
    }

    /// True when the backend flagged this reply as high-risk.
    pub fn is_safety_alert(&self) -> bool {
        self.safety
            .as_deref()
            .is_some_and(|s| s.contains(SAFETY_ALERT_MARKER))
    }

    /// Short display form of the sentiment analysis.
    ///
    /// The backend sends something like `"Emotion: Anxious\nSuggested Tone: Calm"`;
    /// only the emotion itself is worth showing. Nothing is shown for an
    /// empty sentiment.
    pub fn sentiment_label(&self) -> Option<String> {
        let sentiment = self.sentiment.as_deref().filter(|s| !s.is_empty())?;
        let stripped = sentiment.replacen(SENTIMENT_PREFIX, "", 1);
        let label = stripped.split('\n').next().unwrap_or_default();
        (!label.is_empty()).then(|| label.to_string())
    }
}
