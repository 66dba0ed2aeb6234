use reqwest::Client;
use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::{ChatReply, MessagingClient};

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

/// HTTP client for the wellness backend (`POST /chat`, `GET /health`).
#[derive(Clone)]
pub struct WellnessClient {
    client: Client,
    base_url: String,
    session_id: Option<String>,
}

impl WellnessClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session_id: None,
        }
    }

    /// Tag every request with a backend session id.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn chat(&self, message: &str) -> Result<ChatReply> {
        let url = format!("{}/chat", self.base_url);

        let request = ChatRequest {
            message,
            session_id: self.session_id.as_deref(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Wellness API error {}: {}", status, text));
        }

        let reply: ChatReply = response.json().await?;
        Ok(reply)
    }

    /// Returns the status the backend reports (`"ok"` when healthy).
    pub async fn health(&self) -> Result<String> {
        let url = format!("{}/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Health check failed with status: {}", response.status()));
        }

        let health: HealthResponse = response.json().await?;
        Ok(health.status)
    }
}

#[async_trait]
impl MessagingClient for WellnessClient {
    async fn send(&self, message: &str) -> Result<ChatReply> {
        self.chat(message).await
    }
}
