//! Error types for the sync engine.
//!
//! Network failures are kept separate in [`NetworkError`] so callers can tell
//! a transient outage (queue and retry on the next trigger) from a local
//! storage or configuration fault.

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::network::NetworkError;

/// Errors raised by the cache, the durable queue and the request engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// The request could not reach the server and was not queueable.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The durable queue file could not be read or written.
    #[error("sync queue storage failed at '{path}': {message}")]
    Storage {
        /// Queue file relative to the queue directory.
        path: Utf8PathBuf,
        /// Description of the I/O failure.
        message: String,
    },

    /// The durable queue file holds JSON this build cannot read.
    #[error("sync queue file '{path}' is corrupt: {message}")]
    Corrupt {
        /// Queue file relative to the queue directory.
        path: Utf8PathBuf,
        /// Description of the decode failure.
        message: String,
    },

    /// A blocking queue task panicked or was cancelled.
    #[error("sync queue worker stopped: {message}")]
    Worker {
        /// Description of the join failure.
        message: String,
    },

    /// A cache namespace rejected a read or write.
    #[error("cache operation failed: {message}")]
    Cache {
        /// Description of the cache failure.
        message: String,
    },

    /// The engine was configured with unusable settings.
    #[error("invalid sync configuration: {message}")]
    Config {
        /// Description of the rejected setting.
        message: String,
    },
}

impl SyncError {
    /// Build a cache failure.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Build a blocking-task failure.
    pub fn worker(message: impl Into<String>) -> Self {
        Self::Worker {
            message: message.into(),
        }
    }

    /// Build a configuration failure.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the failure clears up by itself once connectivity returns.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(error) if error.is_transient())
    }
}
