//! Chat-list backend client
//!
//! The backend service owns the set of chats subscribed to the bot. The
//! router fetches the full list before every broadcast; the fetch is bounded
//! by the caller's timeout and a failure suppresses the broadcast.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{Chat, ChatBackend, NotifyError};

/// Reply from `GET /chats`
#[derive(Debug, Deserialize)]
struct ChatListReply {
    chats: Vec<Chat>,
}

/// HTTP client for the chat-list backend service
pub struct HttpBackend {
    client: Client,
    base: String,
}

impl HttpBackend {
    /// Create a client for the backend at `endpoint` (`"address:port"`)
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Http` if the HTTP client cannot be built.
    pub fn new(endpoint: &str) -> Result<Self, NotifyError> {
        let client = Client::builder().build()?;
        let base = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.trim_end_matches('/').to_string()
        } else {
            format!("http://{endpoint}")
        };

        Ok(Self { client, base })
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn chat_list(&self, timeout: Duration) -> Result<Vec<Chat>, NotifyError> {
        let request = async {
            let reply: ChatListReply = self
                .client
                .get(format!("{}/chats", self.base))
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            Ok(reply.chats)
        };

        tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| NotifyError::Timeout(timeout))?
    }

    async fn close(&self) {
        tracing::debug!("backend connection released");
    }
}
