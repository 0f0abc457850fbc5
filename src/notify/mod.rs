//! Notification collaborators for the routing pipeline
//!
//! The router talks to three external services through the narrow traits
//! defined here:
//!
//! - [`Notifier`] - sends a text message to one chat (Telegram Bot API)
//! - [`ChatBackend`] - fetches the current subscriber chat list
//! - [`EventPublisher`] - publishes a price event to a pub/sub topic
//!
//! Every call that may block is bounded by a caller-supplied timeout.
//! Delivery failures are logged and skipped by the router, never retried.

pub mod backend;
pub mod pubsub;
pub mod telegram;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// Re-exports
pub use backend::HttpBackend;
pub use pubsub::RedisPublisher;
pub use telegram::TelegramNotifier;

/// Errors raised by the notification collaborators
#[derive(Error, Debug)]
pub enum NotifyError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote API accepted the request but reported a failure
    #[error("API error: {0}")]
    Api(String),

    /// Redis client error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Payload encoding error
    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Bounded operation did not finish in time
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// One subscribed chat, as returned by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Chat identifier
    pub id: i64,
}

/// Event published when the extracted price reaches the threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceEvent {
    /// Extracted price
    pub price: f64,
    /// Human-readable reason
    pub message: String,
    /// When the triggering poll result was observed
    pub observed_at: DateTime<Utc>,
}

impl PriceEvent {
    /// Create the "price is higher" event for an extracted price
    pub fn higher(price: f64) -> Self {
        Self {
            price,
            message: "price is higher".to_string(),
            observed_at: Utc::now(),
        }
    }
}

/// Sends a text message to a single chat
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `text` to `chat_id`
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), NotifyError>;

    /// Release the underlying connection; called once during shutdown
    async fn close(&self) {}
}

/// Fetches the current subscriber chat list from the backend service
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Fetch the chat list, bounded by `timeout`
    async fn chat_list(&self, timeout: Duration) -> Result<Vec<Chat>, NotifyError>;

    /// Release the underlying connection; called once during shutdown
    async fn close(&self) {}
}

/// Publishes price events to a pub/sub topic
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish `event`, bounded by `timeout`
    async fn publish(&self, event: &PriceEvent, timeout: Duration) -> Result<(), NotifyError>;

    /// Release the underlying connection; called once during shutdown
    async fn close(&self) {}
}
