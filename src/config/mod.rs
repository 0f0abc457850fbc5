//! Assign-once configuration state for the watch pipeline
//!
//! Configuration is populated exactly once during startup: every field of
//! [`ConfigState`] may be set one time and any later attempt fails with
//! [`ConfigError::AlreadySet`] without mutating the stored value. Once the
//! process is configured the state is frozen into an immutable
//! [`WatchContext`] that the orchestrator and router share behind an `Arc`,
//! so nothing is locked after the first poller starts.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::error::Result;
use crate::notify::{ChatBackend, EventPublisher, Notifier, TelegramNotifier};

/// Default poll interval for page entries that do not declare one
const DEFAULT_INTERVAL_SECS: u64 = 900;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The field was already assigned; the stored value is unchanged
    #[error("{0} already set")]
    AlreadySet(&'static str),

    /// The supplied value is unusable
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

/// One watched page, as declared in the page list file
///
/// `interval_secs` and `random_delay` are consumed by the poller; the
/// routing core reads only `id`, `url` and `product`.
#[derive(Debug, Clone, Deserialize)]
pub struct PageSpec {
    /// Unique page identifier; entries without one are dropped with a warning
    pub id: Option<String>,
    /// Page URL to poll
    pub url: String,
    /// Product name used in broadcast messages; falls back to the page id
    pub product: Option<String>,
    /// Seconds between polls
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Add a random offset to each poll interval
    #[serde(default)]
    pub random_delay: bool,
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

#[derive(Debug, Deserialize)]
struct PageFile {
    pages: Vec<PageSpec>,
}

/// Load the page list from a TOML file with `[[pages]]` entries
///
/// A missing or unparsable file is a fatal startup error.
pub fn load_pages(path: &Path) -> Result<Vec<PageSpec>> {
    let content = std::fs::read_to_string(path)?;
    let file: PageFile = toml::from_str(&content)?;

    tracing::debug!(count = file.pages.len(), path = %path.display(), "page list loaded");
    Ok(file.pages)
}

#[derive(Default)]
struct StateInner {
    backend_endpoint: String,
    pages: HashMap<String, PageSpec>,
    notifier: Option<Arc<dyn Notifier>>,
    backend: Option<Arc<dyn ChatBackend>>,
    publisher: Option<Arc<dyn EventPublisher>>,
    admin_chat_id: i64,
}

/// Process configuration with assign-once fields
///
/// All setters take the same internal lock only for the duration of the
/// check-and-set. Callers must finish every `set_*` call before starting
/// pollers; [`ConfigState::freeze`] enforces this by consuming the state.
#[derive(Default)]
pub struct ConfigState {
    inner: Mutex<StateInner>,
}

impl ConfigState {
    /// Create an empty configuration state
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StateInner> {
        self.inner.lock().expect("config state lock poisoned")
    }

    /// Store the backend endpoint as `"address:port"`
    pub fn set_backend_endpoint(&self, address: &str, port: u16) -> Result<()> {
        if address.is_empty() {
            return Err(ConfigError::InvalidArgument("backend address is empty").into());
        }

        let mut inner = self.lock();
        if !inner.backend_endpoint.is_empty() {
            return Err(ConfigError::AlreadySet("backend endpoint").into());
        }
        inner.backend_endpoint = format!("{address}:{port}");

        Ok(())
    }

    /// Store the page mapping, keyed by page id
    ///
    /// Entries without an id are skipped with a warning, not an error.
    pub fn set_pages(&self, pages: Vec<PageSpec>) -> Result<()> {
        let mut inner = self.lock();
        if !inner.pages.is_empty() {
            return Err(ConfigError::AlreadySet("pages").into());
        }

        for page in pages {
            match &page.id {
                Some(id) => {
                    inner.pages.insert(id.clone(), page);
                }
                None => {
                    tracing::warn!(url = %page.url, "page entry has no id, skipping");
                }
            }
        }

        Ok(())
    }

    /// Authenticate `token` against the Telegram API and store the handle
    pub async fn set_notifier(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            return Err(ConfigError::InvalidArgument("telegram token is empty").into());
        }
        if self.lock().notifier.is_some() {
            return Err(ConfigError::AlreadySet("telegram bot").into());
        }

        let bot = TelegramNotifier::login(token).await?;
        self.set_notifier_handle(Arc::new(bot))
    }

    /// Store an already-authenticated notifier handle
    pub fn set_notifier_handle(&self, handle: Arc<dyn Notifier>) -> Result<()> {
        let mut inner = self.lock();
        if inner.notifier.is_some() {
            return Err(ConfigError::AlreadySet("telegram bot").into());
        }
        inner.notifier = Some(handle);

        Ok(())
    }

    /// Store the chat-list backend handle
    pub fn set_backend_handle(&self, handle: Arc<dyn ChatBackend>) -> Result<()> {
        let mut inner = self.lock();
        if inner.backend.is_some() {
            return Err(ConfigError::AlreadySet("backend client").into());
        }
        inner.backend = Some(handle);

        Ok(())
    }

    /// Store the pub/sub topic handle
    pub fn set_publisher_handle(&self, handle: Arc<dyn EventPublisher>) -> Result<()> {
        let mut inner = self.lock();
        if inner.publisher.is_some() {
            return Err(ConfigError::AlreadySet("pub/sub topic").into());
        }
        inner.publisher = Some(handle);

        Ok(())
    }

    /// Store the administrator chat id
    pub fn set_admin_chat_id(&self, id: i64) -> Result<()> {
        let mut inner = self.lock();
        if inner.admin_chat_id > 0 {
            return Err(ConfigError::AlreadySet("admin chat id").into());
        }
        inner.admin_chat_id = id;

        Ok(())
    }

    /// Consume the state into an immutable context shared by the
    /// orchestrator and router
    ///
    /// After this point no field can change, so readers need no lock.
    pub fn freeze(self, threshold: f64, site_name: String) -> WatchContext {
        let inner = self.inner.into_inner().expect("config state lock poisoned");

        WatchContext {
            threshold,
            site_name,
            backend_endpoint: inner.backend_endpoint,
            pages: inner.pages,
            notifier: inner.notifier,
            backend: inner.backend,
            publisher: inner.publisher,
            admin_chat_id: inner.admin_chat_id,
        }
    }
}

/// Immutable configuration snapshot, built once at startup
pub struct WatchContext {
    /// Price threshold separating event publication from broadcast
    pub threshold: f64,
    /// Site name used in broadcast messages
    pub site_name: String,
    /// Backend endpoint as `"address:port"`, empty when unset
    pub backend_endpoint: String,
    /// Watched pages keyed by id
    pub pages: HashMap<String, PageSpec>,
    /// Notification bot handle
    pub notifier: Option<Arc<dyn Notifier>>,
    /// Chat-list backend handle
    pub backend: Option<Arc<dyn ChatBackend>>,
    /// Pub/sub topic handle
    pub publisher: Option<Arc<dyn EventPublisher>>,
    /// Administrator chat id; zero when no admin channel is configured
    pub admin_chat_id: i64,
}

impl WatchContext {
    /// Whether the administrator alert channel is usable
    pub fn admin_channel_ready(&self) -> bool {
        self.admin_chat_id > 0 && self.notifier.is_some()
    }
}
