//! Error types for platform-mcp.

use thiserror::Error;

use crate::platform::PlatformError;
use crate::resource::ResourceKind;

/// Result type for platform-mcp operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for platform-mcp.
#[derive(Debug, Error)]
pub enum Error {
    /// Request rejected before any platform call.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource with this name already exists.
    #[error("{kind} with name '{name}' already exists")]
    AlreadyExists { kind: ResourceKind, name: String },

    /// Resource does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: ResourceKind, name: String },

    /// A platform call failed.
    #[error("failed to {action}: {source}")]
    Platform {
        action: String,
        #[source]
        source: PlatformError,
    },

    /// Creation settled in a final status other than DEPLOYED.
    #[error("{kind} '{name}' reached final status '{status}' (not deployed)")]
    NotDeployed {
        kind: ResourceKind,
        name: String,
        status: String,
    },

    /// Deletion observed a status that is not progress toward removal.
    #[error("unexpected state '{status}' during deletion of {kind} '{name}'")]
    UnexpectedDeletionState {
        kind: ResourceKind,
        name: String,
        status: String,
    },

    /// Status could not be determined within the poll budget.
    #[error("{0}")]
    StatusUnavailable(String),

    /// Poll budget exhausted without reaching the target state.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Caller cancelled the operation.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Caller-supplied deadline passed.
    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid parameters.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}

impl Error {
    /// Wrap a platform error with the action that produced it.
    pub fn platform(action: impl Into<String>, source: PlatformError) -> Self {
        Self::Platform {
            action: action.into(),
            source,
        }
    }
}
