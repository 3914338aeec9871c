// src/error.rs
//! Error handling for the whole crate.
//!
//! Load and upload failures travel as [`ResourceError`](crate::resource::ResourceError) values through the upload
//! queue and are never raised. [`Error`] is reserved for failures a caller can
//! observe synchronously: a missing cache entry or a task handle whose job
//! panicked or never ran.

use thiserror::Error;

/// Main error type: `Send + Sync + 'static`, cheap to match on.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A cache lookup for a key that was never stored (or has been cleared).
    #[error("resource '{key}' is not accessible: {message}")]
    ResourceUnavailable { key: String, message: String },

    /// The callable behind a [`TaskHandle`](crate::thread_pool::TaskHandle) panicked.
    #[error("task panicked: {0}")]
    TaskPanicked(String),

    /// The job was discarded by a cancelling shutdown before it ran.
    #[error("task was cancelled before it ran")]
    TaskCancelled,
}

impl Error {
    #[inline]
    pub fn unavailable<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        Self::ResourceUnavailable {
            key: key.into(),
            message: message.into(),
        }
    }

    #[inline]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::ResourceUnavailable { .. })
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::TaskCancelled)
    }
}

/// Convenient `Result` alias, use `crate::Result<T>` everywhere.
pub type Result<T> = std::result::Result<T, Error>;
