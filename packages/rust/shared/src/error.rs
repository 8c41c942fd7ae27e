//! Error types for Postnote.
//!
//! Library crates use [`PostnoteError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Fatal kinds (`Config`, `Discovery`) abort a run before or during
//! discovery; per-post kinds (`MalformedContent`, `Conflict`, `Transport`)
//! are caught at the task boundary and recorded without stopping the batch.

use std::path::PathBuf;

/// Top-level error type for all Postnote operations.
#[derive(Debug, thiserror::Error)]
pub enum PostnoteError {
    /// Missing or invalid run inputs (URL, key, post ids, config file).
    #[error("config error: {message}")]
    Config { message: String },

    /// Post discovery (browse/pagination) failure.
    #[error("discovery error: {0}")]
    Discovery(String),

    /// A post's existing content cannot be parsed into the expected structure.
    #[error("malformed content: {message}")]
    MalformedContent { message: String },

    /// Stale `updated_at` stamp rejected by the store on write-back.
    #[error("update conflict: {message}")]
    Conflict { message: String },

    /// Network/auth failure talking to the Admin API.
    #[error("transport error: {0}")]
    Transport(String),

    /// Filesystem I/O error (config file handling).
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PostnoteError>;

impl PostnoteError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a malformed-content error from any displayable message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedContent {
            message: msg.into(),
        }
    }

    /// Create a conflict error from any displayable message.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error aborts the whole run rather than a single post.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Discovery(_) | Self::Io { .. })
    }
}
