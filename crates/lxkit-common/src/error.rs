//! Unified error types for the lxkit workspace.
//!
//! Every fallible lifecycle, config, and cgroup operation reports one of
//! these variants instead of panicking. [`LxkitError::kind`] folds them
//! into the coarse taxonomy callers usually branch on.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::types::ContainerState;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum LxkitError {
    /// The container is not in a state that permits the operation.
    #[error("cannot {operation} container {name}: container is {state}")]
    InvalidState {
        /// Container name.
        name: String,
        /// State observed when the operation was attempted.
        state: ContainerState,
        /// Operation that was rejected.
        operation: &'static str,
    },

    /// A container with this name is already defined.
    #[error("container {name} already exists")]
    AlreadyExists {
        /// Name that is already in use.
        name: String,
    },

    /// The container has no persisted configuration.
    #[error("container {name} is not defined")]
    NotDefined {
        /// Container name.
        name: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// The container engine failed to carry out an operation.
    #[error("{operation} failed for container {name}: {message}")]
    Engine {
        /// Engine operation that failed.
        operation: &'static str,
        /// Container name.
        name: String,
        /// Engine-provided detail.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A blocking operation did not complete within its bound.
    #[error("{operation} timed out for container {name} after {timeout:?}")]
    Timeout {
        /// Operation that timed out.
        operation: &'static str,
        /// Container name.
        name: String,
        /// Bound that elapsed.
        timeout: Duration,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Coarse classification of an [`LxkitError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The operation's precondition did not hold (wrong state, name in use).
    PreconditionViolation,
    /// The engine or host could not carry out the operation.
    ResourceUnavailable,
    /// A bounded wait elapsed.
    Timeout,
    /// The container or a named resource does not exist.
    NotFound,
    /// Input or configuration was malformed.
    Invalid,
}

impl LxkitError {
    /// Returns the taxonomy bucket for this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidState { .. } | Self::AlreadyExists { .. } => {
                ErrorKind::PreconditionViolation
            }
            Self::Engine { .. } | Self::Io { .. } => ErrorKind::ResourceUnavailable,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::NotDefined { .. } | Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Config { .. } | Self::Serialization { .. } => ErrorKind::Invalid,
        }
    }

    /// Shorthand for an [`LxkitError::Engine`] failure.
    pub fn engine(operation: &'static str, name: &str, message: impl Into<String>) -> Self {
        Self::Engine {
            operation,
            name: name.to_owned(),
            message: message.into(),
        }
    }

    /// Shorthand for an [`LxkitError::Io`] failure.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, LxkitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_is_a_precondition_violation() {
        let err = LxkitError::InvalidState {
            name: "web".into(),
            state: ContainerState::Running,
            operation: "destroy",
        };
        assert_eq!(err.kind(), ErrorKind::PreconditionViolation);
        assert_eq!(
            err.to_string(),
            "cannot destroy container web: container is RUNNING"
        );
    }

    #[test]
    fn timeout_reports_bound() {
        let err = LxkitError::Timeout {
            operation: "shutdown",
            name: "db".into(),
            timeout: Duration::from_secs(3),
        };
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.to_string().contains("3s"));
    }

    #[test]
    fn engine_and_io_are_resource_errors() {
        let engine = LxkitError::engine("start", "db", "exit status 1");
        let io = LxkitError::io("/tmp/x", std::io::Error::other("boom"));
        assert_eq!(engine.kind(), ErrorKind::ResourceUnavailable);
        assert_eq!(io.kind(), ErrorKind::ResourceUnavailable);
    }

    #[test]
    fn not_defined_is_not_found() {
        let err = LxkitError::NotDefined { name: "ghost".into() };
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
