//! Error types for ReleaseWatch.
//!
//! Library crates use [`ReleaseWatchError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all ReleaseWatch operations.
#[derive(Debug, thiserror::Error)]
pub enum ReleaseWatchError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a vendor page or feed.
    #[error("network error: {0}")]
    Network(String),

    /// HTML/XML parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// An insert lost the race for a `unique_id` that already exists.
    #[error("update {unique_id} already exists")]
    Conflict { unique_id: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad URL, unknown source key, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ReleaseWatchError>;

impl ReleaseWatchError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
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

    /// Whether this error is the benign duplicate-key signal from storage.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ReleaseWatchError::config("unknown source 'acme'");
        assert_eq!(err.to_string(), "config error: unknown source 'acme'");

        let err = ReleaseWatchError::Storage("database is locked".into());
        assert!(err.to_string().contains("database is locked"));
    }

    #[test]
    fn conflict_is_recognized() {
        let err = ReleaseWatchError::Conflict {
            unique_id: "0123456789abcdef".into(),
        };
        assert!(err.is_conflict());
        assert!(err.to_string().contains("0123456789abcdef"));
        assert!(!ReleaseWatchError::Network("timeout".into()).is_conflict());
    }
}
