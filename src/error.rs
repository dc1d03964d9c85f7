//! Error types for presence-beacon
//!
//! Errors here never reach the host from the heartbeat path: the scheduler
//! logs and discards them per send. They only surface from construction
//! (`HeartbeatConfig::validate`, `ReqwestTransport::new`, `start`) and from
//! storage backends. Uses `thiserror` for the `Display` and `Error` impls.

use thiserror::Error;

/// The primary error type for presence-beacon operations.
#[derive(Error, Debug)]
pub enum BeaconError {
    /// Configuration-related errors (bad endpoint, zero interval, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key-value storage errors (unreadable store file, failed flush, etc.)
    #[error("Storage error: {0}")]
    Storage(String),

    /// No async runtime available to drive the ticker
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Transport failures that are not plain HTTP client errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors (connect, DNS, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BeaconError {
    /// Short variant name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "Config",
            Self::Storage(_) => "Storage",
            Self::Runtime(_) => "Runtime",
            Self::Transport(_) => "Transport",
            Self::Io(_) => "Io",
            Self::Json(_) => "Json",
            Self::Http(_) => "Http",
        }
    }
}

/// A specialized `Result` type for presence-beacon operations.
pub type Result<T> = std::result::Result<T, BeaconError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BeaconError::Config("interval must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: interval must be positive"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BeaconError = io_err.into();
        assert!(matches!(err, BeaconError::Io(_)));
        assert_eq!(err.kind(), "Io");
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: BeaconError = json_err.into();
        assert!(matches!(err, BeaconError::Json(_)));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(BeaconError::Storage("x".into()).kind(), "Storage");
        assert_eq!(BeaconError::Runtime("x".into()).kind(), "Runtime");
        assert_eq!(BeaconError::Transport("x".into()).kind(), "Transport");
    }
}
