//! Error types for arxiv-daily.
//!
//! Library crates use [`ArxivDailyError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all arxiv-daily operations.
#[derive(Debug, thiserror::Error)]
pub enum ArxivDailyError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error talking to arxiv or the code-link service.
    #[error("network error: {0}")]
    Network(String),

    /// Malformed API response (Atom feed, JSON payload).
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Text-generation service error (request, API, or response shape).
    #[error("summarizer error: {0}")]
    Summarizer(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (schema mismatch, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ArxivDailyError>;

impl ArxivDailyError {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ArxivDailyError::config("missing topics");
        assert_eq!(err.to_string(), "config error: missing topics");

        let err = ArxivDailyError::validation("schema_version 99 not supported");
        assert!(err.to_string().contains("schema_version 99"));

        let err = ArxivDailyError::Network("http://export.arxiv.org: HTTP 503".into());
        assert!(err.to_string().starts_with("network error:"));
    }

    #[test]
    fn io_error_carries_path() {
        let err = ArxivDailyError::io(
            "docs/index.md",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("docs/index.md"));
        assert!(msg.contains("denied"));
    }
}
