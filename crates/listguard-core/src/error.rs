//! Error types for listguard.
//!
//! Local conditions (an unwatched list, a malformed request) are kept
//! distinct from failures reported by the external executor, which are
//! carried through untouched.

use crate::models::MemberMode;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for list coordination.
#[derive(Debug, Error)]
pub enum ListError {
    // Registry errors
    #[error("List was not properly added to the system: {list}")]
    UnwatchedList { list: String },

    #[error("Discovery failed for spool {spool}: {message}")]
    Discovery { spool: String, message: String },

    // Request validation errors
    #[error("Invalid subscription type {mode} for {operation}")]
    InvalidRequest {
        operation: &'static str,
        mode: MemberMode,
    },

    // Executor errors
    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

/// Result type alias for listguard operations.
pub type Result<T> = std::result::Result<T, ListError>;

/// Failure reported by an [`OperationExecutor`](crate::executor::OperationExecutor)
/// or a [`ListDiscovery`](crate::executor::ListDiscovery) implementation.
///
/// The coordinator never interprets these; it hands them back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ExecutorError {
    /// Human readable failure description.
    pub message: String,
    /// Raw output produced by the executor before it failed, if any.
    pub output: Option<String>,
}

impl ExecutorError {
    /// Create an executor error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            output: None,
        }
    }

    /// Attach the executor's raw output to this error.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }
}

impl From<std::io::Error> for ListError {
    fn from(err: std::io::Error) -> Self {
        ListError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for ListError {
    fn from(err: serde_json::Error) -> Self {
        ListError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl ListError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        ListError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// True if the list was not known to the registry when the guard was requested.
    pub fn is_unwatched(&self) -> bool {
        matches!(self, ListError::UnwatchedList { .. })
    }

    /// Check if a caller may reasonably retry the failed operation.
    ///
    /// Nothing in this crate retries on its own. Executor failures are opaque,
    /// so only a timeout is reported as retryable here.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ListError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ListError::UnwatchedList {
            list: "/var/spool/mlmmj/beta".into(),
        };
        assert_eq!(
            err.to_string(),
            "List was not properly added to the system: /var/spool/mlmmj/beta"
        );

        let err = ListError::InvalidRequest {
            operation: "unsubscription",
            mode: MemberMode::Owner,
        };
        assert_eq!(
            err.to_string(),
            "Invalid subscription type Owner for unsubscription"
        );
    }

    #[test]
    fn test_executor_error_passthrough() {
        let inner = ExecutorError::new("list exists").with_output("mlmmj-make-ml: list exists");
        let err: ListError = inner.clone().into();
        match err {
            ListError::Executor(e) => assert_eq!(e, inner),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classification() {
        assert!(ListError::UnwatchedList { list: "a".into() }.is_unwatched());
        assert!(!ListError::Cancelled.is_unwatched());
        assert!(ListError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(!ListError::UnwatchedList { list: "a".into() }.is_retryable());
        assert!(!ListError::Executor(ExecutorError::new("boom")).is_retryable());
    }
}
