pub mod wellness;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use wellness::WellnessClient;

/// What the backend returns for one user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub safety: Option<String>,
}

/// Anything that can turn a user message into a reply.
///
/// Each call is stateless from the caller's side: only the new message is
/// sent, never the transcript.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    async fn send(&self, message: &str) -> Result<ChatReply>;
}
