//! The notification sink capability.

use std::time::Duration;

use async_trait::async_trait;
use upwatch_core::MonitorEvent;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for a failed delivery to one sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The chat endpoint could not be reached or did not answer in time.
    #[error("Could not reach sink endpoint: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Sink endpoint returned HTTP {0}")]
    HttpStatus(u16),

    /// The chat API accepted the request but reported an error.
    #[error("Chat API rejected message: {0}")]
    ChatApi(String),

    /// The Postgres availability store could not be read or written.
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// The Redis availability store rejected a command or dropped the connection.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The availability store did not answer within the allowed time.
    #[error("Store did not respond within {0:?}")]
    StoreTimeout(Duration),

    /// The stored value could not be encoded.
    #[error("Payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// Writing to a local stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// NotificationSink
// ---------------------------------------------------------------------------

/// A destination for monitor events.
///
/// Implementations must be safe to call from several tasks at once; the
/// [`Dispatcher`](crate::dispatcher::Dispatcher) shares them behind an `Arc`.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Short identifier used in log fields.
    fn name(&self) -> &str;

    /// Deliver one event.
    async fn notify(&self, event: &MonitorEvent) -> Result<(), SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_http_status() {
        let err = SinkError::HttpStatus(502);
        assert_eq!(err.to_string(), "Sink endpoint returned HTTP 502");
    }

    #[test]
    fn display_chat_api() {
        let err = SinkError::ChatApi("channel_not_found".into());
        assert_eq!(err.to_string(), "Chat API rejected message: channel_not_found");
    }

    #[test]
    fn unbuildable_chat_request_maps_to_request_error() {
        let source = reqwest::Client::new()
            .post("chat.example/no-scheme")
            .build()
            .unwrap_err();
        let err = SinkError::from(source);
        assert!(matches!(err, SinkError::Request(_)));
        assert!(err.to_string().starts_with("Could not reach sink endpoint"));
    }

    #[test]
    fn display_store_timeout() {
        let err = SinkError::StoreTimeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "Store did not respond within 5s");
    }

    #[test]
    fn display_io() {
        let err = SinkError::Io(std::io::Error::other("pipe closed"));
        assert!(err.to_string().starts_with("I/O error:"));
    }
}
