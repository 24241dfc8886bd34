//! Error types for autocat.
//!
//! Library crates use [`CatError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all autocat operations.
#[derive(Debug, thiserror::Error)]
pub enum CatError {
    /// Configuration loading or parsing error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Input that cannot be used as given (non-local file spec, bad glob, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Remote source answered with a non-2xx status.
    #[error("failed to fetch {url}: {status} {reason}")]
    Fetch {
        url: String,
        status: u16,
        reason: String,
    },

    /// Transport-level HTTP failure.
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A discovered executable could not be started.
    #[error("failed to run {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A discovered executable exited unsuccessfully.
    #[error("generator failed for {}{}", .path.display(), stderr_suffix(.code, .stderr))]
    Subprocess {
        path: PathBuf,
        code: Option<i32>,
        stderr: String,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CatError>;

fn stderr_suffix(code: &Option<i32>, stderr: &str) -> String {
    let status = match code {
        Some(code) => format!(" (exit code {code})"),
        None => " (terminated by signal)".to_string(),
    };
    if stderr.is_empty() {
        status
    } else {
        format!("{status}\n{stderr}")
    }
}

impl CatError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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

    /// Wrap a transport error with the URL that was being fetched.
    pub fn network(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Network {
            url: url.into(),
            source: source.into(),
        }
    }
}
