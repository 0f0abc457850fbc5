//! Telegram Bot API notifier
//!
//! Authenticates once at startup via `getMe` and sends messages through
//! `sendMessage`. A failed authentication is a fatal startup error; a failed
//! send is reported to the caller, which logs and skips it.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{Notifier, NotifyError};

const TELEGRAM_API: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Generic Telegram Bot API reply envelope
#[derive(Debug, Deserialize)]
struct ApiReply<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

/// The authenticated bot account, from `getMe`
#[derive(Debug, Deserialize)]
struct BotAccount {
    username: Option<String>,
}

/// Telegram notifier handle
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct TelegramNotifier {
    client: Client,
    /// `{api}/bot{token}` prefix for all method calls
    base: String,
}

impl TelegramNotifier {
    /// Authenticate `token` against the Telegram Bot API
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Http` if the API is unreachable and
    /// `NotifyError::Api` if Telegram rejects the token.
    pub async fn login(token: &str) -> Result<Self, NotifyError> {
        Self::login_at(TELEGRAM_API, token).await
    }

    /// Authenticate against a custom API base URL, used by tests with mock
    /// servers
    pub async fn login_at(api: &str, token: &str) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let base = format!("{api}/bot{token}");

        let reply: ApiReply<BotAccount> = client
            .get(format!("{base}/getMe"))
            .send()
            .await?
            .json()
            .await?;

        if !reply.ok {
            return Err(NotifyError::Api(
                reply
                    .description
                    .unwrap_or_else(|| "authentication rejected".to_string()),
            ));
        }

        let account = reply.result.and_then(|a| a.username).unwrap_or_default();
        tracing::debug!(account = %account, "telegram bot authorized");

        Ok(Self { client, base })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), NotifyError> {
        let reply: ApiReply<serde_json::Value> = self
            .client
            .post(format!("{}/sendMessage", self.base))
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await?
            .json()
            .await?;

        if !reply.ok {
            return Err(NotifyError::Api(
                reply
                    .description
                    .unwrap_or_else(|| "send rejected".to_string()),
            ));
        }

        Ok(())
    }

    async fn close(&self) {
        tracing::debug!("telegram notifier released");
    }
}
