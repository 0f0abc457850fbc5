//! Per-result decision pipeline
//!
//! [`ResponseRouter`] receives one [`PollOutcome`] per polling cycle and
//! reaches exactly one terminal [`Decision`]: an administrator alert, a
//! price-event publication, a subscriber broadcast, or suppression. The
//! branches are mutually exclusive; no outcome ever produces both a price
//! event and a broadcast.
//!
//! The router never returns an error to the poller. Collaborator failures
//! are logged and absorbed here; the only bounded suspension points are the
//! chat-list fetch and the event publish, both capped at five seconds.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

use crate::config::WatchContext;
use crate::notify::PriceEvent;
use crate::parser;
use crate::poller::{OutcomeHandler, PollOutcome};

/// Bound on the pub/sub publish
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on the backend chat-list fetch
const CHAT_LIST_TIMEOUT: Duration = Duration::from_secs(5);

/// Terminal decision for one poll outcome
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// An alert was sent (or attempted) to the administrator chat
    AdminAlert(String),
    /// A price event was published (or attempted) to the pub/sub topic
    PriceEvent(f64),
    /// The subscriber list was broadcast to; failed chats were skipped
    Broadcast {
        /// Extracted price carried in the message
        price: f64,
        /// Chats the send succeeded for
        sent: usize,
        /// Chats in the fetched list
        total: usize,
    },
    /// No notification fired
    Suppressed(&'static str),
}

/// The per-result decision pipeline
///
/// Holds only the read-only configuration it closes over; safe to share
/// across every polling task.
pub struct ResponseRouter {
    ctx: Arc<WatchContext>,
}

impl ResponseRouter {
    /// Create a router over the frozen configuration
    pub fn new(ctx: Arc<WatchContext>) -> Self {
        Self { ctx }
    }

    /// Run one outcome through the pipeline and return the terminal decision
    pub async fn route(&self, outcome: PollOutcome) -> Decision {
        let page_id = outcome.page_id;

        // 1. Transport error: surfaced via logs only.
        if let Some(err) = outcome.error {
            tracing::error!(id = %page_id, error = %err, "error on response");
            return Decision::Suppressed("transport error");
        }

        let Some(response) = outcome.response else {
            tracing::error!(id = %page_id, "outcome carried neither response nor error");
            return Decision::Suppressed("empty outcome");
        };

        // 2. Non-success status: alert the admin when the channel is up.
        let status = response.status();
        if status != StatusCode::OK {
            tracing::info!(id = %page_id, status = %status, "got response");
            let message = format!("poller with id {page_id} returned status {status}");
            return self.alert_admin(message).await;
        }

        // 3. Structural parse step: a body that cannot be read is an admin
        //    alert; a body without a usable price field is not.
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(id = %page_id, error = %err, "could not scrape website");
                let message =
                    format!("could not scrape website: poller {page_id} returned error {err}");
                return self.alert_admin(message).await;
            }
        };

        let price = parser::extract_price(&body);

        // 4. Threshold evaluation: at or above threshold publishes an event
        //    and always stops.
        if price >= self.ctx.threshold {
            return self.publish_event(&page_id, price).await;
        }

        // 5. Below threshold: broadcast to every subscribed chat.
        self.broadcast(&page_id, price).await
    }

    /// Send `message` to the admin chat when the channel is configured
    async fn alert_admin(&self, message: String) -> Decision {
        if !self.ctx.admin_channel_ready() {
            return Decision::Suppressed("admin channel not configured");
        }

        // admin_channel_ready guarantees the handle
        let Some(notifier) = &self.ctx.notifier else {
            return Decision::Suppressed("admin channel not configured");
        };

        if let Err(err) = notifier.send(self.ctx.admin_chat_id, &message).await {
            tracing::error!(error = %err, "error while notifying admin");
        }

        Decision::AdminAlert(message)
    }

    /// Publish the "price is higher" event to the pub/sub topic
    async fn publish_event(&self, page_id: &str, price: f64) -> Decision {
        let Some(publisher) = &self.ctx.publisher else {
            tracing::debug!(id = %page_id, price, "price at threshold but no topic configured");
            return Decision::Suppressed("no pub/sub topic configured");
        };

        let event = PriceEvent::higher(price);
        if let Err(err) = publisher.publish(&event, PUBLISH_TIMEOUT).await {
            tracing::error!(id = %page_id, error = %err, "error while publishing price event");
        }

        Decision::PriceEvent(price)
    }

    /// Fetch the subscriber list and send the buy message to every chat
    async fn broadcast(&self, page_id: &str, price: f64) -> Decision {
        let Some(notifier) = &self.ctx.notifier else {
            tracing::error!(id = %page_id, "bot was not set: no message will be sent");
            return Decision::Suppressed("notifier not configured");
        };
        let Some(backend) = &self.ctx.backend else {
            tracing::error!(id = %page_id, "no backend is set: no message will be sent");
            return Decision::Suppressed("backend not configured");
        };

        let chats = match backend.chat_list(CHAT_LIST_TIMEOUT).await {
            Ok(chats) => chats,
            Err(err) => {
                tracing::error!(id = %page_id, error = %err, "error while getting chats list");
                return Decision::Suppressed("chat list fetch failed");
            }
        };

        let page = self.ctx.pages.get(page_id);
        let product = page
            .and_then(|p| p.product.as_deref())
            .unwrap_or(page_id);
        let url = page.map(|p| p.url.as_str()).unwrap_or_default();
        let message = format!(
            "{product} is now priced {price} at {site}! Go buy at {url}",
            site = self.ctx.site_name
        );

        let total = chats.len();
        let mut sent = 0;
        for chat in &chats {
            if let Err(err) = notifier.send(chat.id, &message).await {
                tracing::error!(
                    chat_id = chat.id,
                    error = %err,
                    "error while sending message to this chat, skipping"
                );
                continue;
            }
            sent += 1;
        }

        tracing::info!(id = %page_id, sent, total, "broadcast complete");
        Decision::Broadcast { price, sent, total }
    }
}

#[async_trait]
impl OutcomeHandler for ResponseRouter {
    async fn handle(&self, outcome: PollOutcome) {
        let decision = self.route(outcome).await;
        tracing::debug!(?decision, "outcome routed");
    }
}
