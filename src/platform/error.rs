//! Error types for the platform API client.

use thiserror::Error;

/// Errors returned by the remote platform, classified by HTTP status.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Requested resource was not found (404).
    #[error("not found (404): {0}")]
    NotFound(String),

    /// Resource already exists (409).
    #[error("conflict (409): {0}")]
    Conflict(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized (401): {0}")]
    Unauthorized(String),

    /// Credentials lack permission for the operation (403).
    #[error("permission denied (403): {0}")]
    PermissionDenied(String),

    /// Rate limit exceeded (429).
    #[error("rate limit exceeded (429): {0}")]
    RateLimited(String),

    /// Server error (5xx).
    #[error("server error ({status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Any other non-success response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Failed to parse a response body.
    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl PlatformError {
    /// Classify a non-success status code and its extracted message.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => Self::Unauthorized(message),
            403 => Self::PermissionDenied(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            429 => Self::RateLimited(message),
            500..=599 => Self::Server { status, message },
            _ => Self::Api { status, message },
        }
    }

    /// HTTP status code associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::NotFound(_) => Some(404),
            Self::Conflict(_) => Some(409),
            Self::Unauthorized(_) => Some(401),
            Self::PermissionDenied(_) => Some(403),
            Self::RateLimited(_) => Some(429),
            Self::Server { status, .. } | Self::Api { status, .. } => Some(*status),
            Self::Parse(_) => None,
        }
    }

    /// Whether this error means the resource does not exist.
    ///
    /// Matches a 404 status as well as error text containing "not found",
    /// since some platform endpoints report absence in the body of other
    /// error responses.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404) || self.to_string().to_lowercase().contains("not found")
    }

    /// Whether this error is a 409 conflict.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

/// Result type alias for platform API operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
