//! Per-page polling tasks
//!
//! Each configured page gets one [`HttpPoller`] running as its own tokio
//! task. A poller delivers exactly one [`PollOutcome`] per cycle to its
//! registered [`OutcomeHandler`] and observes the shared shutdown signal
//! between cycles, so cancellation is cooperative: the current cycle always
//! finishes before the task exits. Same-page outcomes are strictly
//! sequential; outcomes across pages interleave freely.

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use url::Url;

use crate::config::PageSpec;

/// Timeout applied to every page fetch
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while creating a poller or fetching a page
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Page URL did not parse
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Page entry carries no id
    #[error("page entry has no id")]
    MissingId,
}

/// One poll result, delivered once per cycle and not retained
///
/// Exactly one of `response` and `error` is populated.
pub struct PollOutcome {
    /// Id of the page this outcome belongs to
    pub page_id: String,
    /// The HTTP response, when the fetch succeeded
    pub response: Option<reqwest::Response>,
    /// The transport error, when it did not
    pub error: Option<FetchError>,
}

/// Callback invoked once per poll outcome
///
/// Handlers never return an error to the poller; every failure is absorbed
/// inside the handler.
#[async_trait]
pub trait OutcomeHandler: Send + Sync {
    /// Consume one outcome
    async fn handle(&self, outcome: PollOutcome);
}

/// HTTP poller for a single page
pub struct HttpPoller {
    id: String,
    url: Url,
    interval: Duration,
    random_delay: bool,
    client: Client,
    handler: Option<Arc<dyn OutcomeHandler>>,
}

impl HttpPoller {
    /// Create a poller for `spec`
    ///
    /// # Errors
    ///
    /// Returns `FetchError::MissingId` for id-less entries,
    /// `FetchError::InvalidUrl` for unparsable URLs and `FetchError::Http`
    /// if the HTTP client cannot be built.
    pub fn new(spec: &PageSpec) -> Result<Self, FetchError> {
        let id = spec.id.clone().ok_or(FetchError::MissingId)?;
        let url =
            Url::parse(&spec.url).map_err(|_| FetchError::InvalidUrl(spec.url.clone()))?;

        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .gzip(true)
            .build()?;

        Ok(Self {
            id,
            url,
            interval: Duration::from_secs(spec.interval_secs.max(1)),
            random_delay: spec.random_delay,
            client,
            handler: None,
        })
    }

    /// The page id this poller is bound to
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Register the result callback; must happen before [`HttpPoller::run`]
    pub fn set_handler(&mut self, handler: Arc<dyn OutcomeHandler>) {
        self.handler = Some(handler);
    }

    /// Delay before the next cycle, with optional jitter
    fn next_delay(&self) -> Duration {
        if self.random_delay {
            let jitter = rand::thread_rng().gen_range(0..=self.interval.as_secs());
            self.interval + Duration::from_secs(jitter)
        } else {
            self.interval
        }
    }

    /// Poll until the shutdown signal fires
    ///
    /// The first poll happens immediately; afterwards the poller sleeps the
    /// configured interval between cycles.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let Some(handler) = self.handler.clone() else {
            tracing::error!(id = %self.id, "poller started without a handler, exiting");
            return;
        };

        tracing::debug!(id = %self.id, url = %self.url, "poller started");

        loop {
            let outcome = match self.client.get(self.url.clone()).send().await {
                Ok(response) => PollOutcome {
                    page_id: self.id.clone(),
                    response: Some(response),
                    error: None,
                },
                Err(err) => PollOutcome {
                    page_id: self.id.clone(),
                    response: None,
                    error: Some(FetchError::Http(err)),
                },
            };

            handler.handle(outcome).await;

            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.next_delay()) => {}
                _ = shutdown.changed() => break,
            }
        }

        tracing::debug!(id = %self.id, "poller stopped");
    }
}
