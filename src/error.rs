//! Error types and handling.

use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend rejected the call; message passed through from the server
    #[error("{0}")]
    Remote(String),

    /// Session cookie no longer valid on the backend
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// Location permission denied by the user or platform
    #[error("Location permission denied")]
    LocationPermissionDenied,

    /// Position could not be acquired (provider fault or timeout)
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// Data parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Create a parse error with message
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a config error with message
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error with message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a remote error carrying the backend's message
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    /// Create a location-unavailable error with message
    pub fn location_unavailable(msg: impl Into<String>) -> Self {
        Self::LocationUnavailable(msg.into())
    }

    /// True for the recoverable location faults that map to the
    /// `Error` geofence status instead of aborting the flow.
    pub fn is_location_fault(&self) -> bool {
        matches!(
            self,
            Self::LocationPermissionDenied | Self::LocationUnavailable(_)
        )
    }
}
