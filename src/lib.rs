//! pricewatch - Product page watcher with notification routing
//!
//! A polling pipeline that watches a set of product pages and, per poll
//! result, decides which notification channel should fire.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Assign-once configuration state and the page list file
//! - [`poller`] - Per-page HTTP polling tasks and the outcome callback
//! - [`parser`] - Price extraction from the polled HTML
//! - [`router`] - The per-result decision pipeline
//! - [`notify`] - Telegram, chat-list backend and Redis pub/sub collaborators
//! - [`orchestrator`] - Poller lifecycle, task spawning and joining
//! - [`shutdown`] - Signal handling and ordered resource release
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pricewatch::config::ConfigState;
//! use pricewatch::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let state = ConfigState::new();
//!     state.set_pages(pricewatch::config::load_pages("pages.toml".as_ref())?)?;
//!     let ctx = Arc::new(state.freeze(300.0, "My Website".into()));
//!     let handle = Orchestrator::new(ctx.clone()).start();
//!     pricewatch::shutdown::run(handle, ctx).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod parser;
pub mod poller;
pub mod router;
pub mod shutdown;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ConfigState, PageSpec, WatchContext};
    pub use crate::error::{ConfigError, Error, FetchError, NotifyError, Result};
    pub use crate::notify::{Chat, ChatBackend, EventPublisher, Notifier, PriceEvent};
    pub use crate::orchestrator::{Orchestrator, WatchHandle};
    pub use crate::poller::{HttpPoller, OutcomeHandler, PollOutcome};
    pub use crate::router::{Decision, ResponseRouter};
}
