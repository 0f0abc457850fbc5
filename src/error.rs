//! Unified error handling for the pricewatch crate
//!
//! Domain-specific errors live next to the code that raises them; this
//! module re-exports them and wraps them in a single [`Error`] enum for use
//! across module boundaries.

use std::io;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::config::ConfigError;
pub use crate::notify::NotifyError;
pub use crate::poller::FetchError;

/// Unified error type for the pricewatch crate
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (assign-once violations, bad arguments)
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Poller creation and fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Notification collaborator errors (Telegram, backend, pub/sub)
    #[error("Notify error: {0}")]
    Notify(#[from] NotifyError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Page list file errors
    #[error("Page file error: {0}")]
    PageFile(#[from] toml::de::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
