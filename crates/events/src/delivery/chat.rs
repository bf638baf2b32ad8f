//! Chat webhook delivery.
//!
//! [`ChatSink`] posts the rendered event message to a Slack-compatible
//! `chat.postMessage` endpoint. Each event is a single attempt: a slow or
//! failing chat API must not hold up the next tick.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use upwatch_core::{ChatConfig, MonitorEvent};

use crate::sink::{NotificationSink, SinkError};

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Outgoing message body.
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    channel: &'a str,
    username: &'a str,
    icon_emoji: &'a str,
    text: String,
}

/// The fields of the chat API response we care about.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// ChatSink
// ---------------------------------------------------------------------------

/// Posts monitor events to a chat channel.
pub struct ChatSink {
    client: reqwest::Client,
    api_url: String,
    token: String,
    channel: String,
    username: String,
    emoji: String,
}

impl ChatSink {
    /// Build a sink from its configuration.
    ///
    /// The token must already be validated as present; an absent token is
    /// treated as empty and the chat API will reject every message.
    pub fn new(config: &ChatConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            token: config.token.clone().unwrap_or_default(),
            channel: config.channel.clone(),
            username: config.username.clone(),
            emoji: config.emoji.clone(),
        })
    }

    fn message<'a>(&'a self, event: &MonitorEvent) -> ChatMessage<'a> {
        ChatMessage {
            channel: &self.channel,
            username: &self.username,
            icon_emoji: &self.emoji,
            text: event.message(),
        }
    }
}

#[async_trait]
impl NotificationSink for ChatSink {
    fn name(&self) -> &str {
        "slack"
    }

    async fn notify(&self, event: &MonitorEvent) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&self.message(event))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SinkError::HttpStatus(response.status().as_u16()));
        }

        let body: ChatResponse = response.json().await?;
        if !body.ok {
            return Err(SinkError::ChatApi(
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        tracing::debug!(channel = %self.channel, unit = %event.target(), "Chat message posted");
        Ok(())
    }
}

impl std::fmt::Debug for ChatSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSink")
            .field("api_url", &self.api_url)
            .field("channel", &self.channel)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
