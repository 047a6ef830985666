//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout duckgate.
//! All errors are structured and map to specific error codes for JSON output.
//!
//! # Error Categories
//! - `Configuration`: Missing token or incompatible flags, raised at startup
//! - `ConnectionFailed`: Backend unreachable, attach or create failure
//! - `NotFound`: Missing file or sheet
//! - `QueryFailed`: Malformed SQL or engine-side fault during execution
//! - `InvalidInput`: Malformed tool arguments
//! - `Engine`: Engine-specific faults outside query execution (bootstrap statements)

use thiserror::Error;

/// Main error type for duckgate operations
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration is unusable (never retried)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// File or sheet does not exist (message names what is missing)
    #[error("{0}")]
    NotFound(String),

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Invalid input or missing required parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Engine-specific database error
    #[error("Engine error ({engine}): {detail}")]
    Engine { engine: String, detail: String },
}

impl GatewayError {
    /// Convert error to error code string for JSON output
    ///
    /// Error codes are stable and suitable for programmatic handling by agents.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::QueryFailed(_) => "QUERY_FAILED",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Engine { .. } => "ENGINE_ERROR",
        }
    }

    /// Get human-readable error message
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Underlying message without the category prefix
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Configuration(detail)
            | Self::ConnectionFailed(detail)
            | Self::NotFound(detail)
            | Self::QueryFailed(detail)
            | Self::InvalidInput(detail)
            | Self::Engine { detail, .. } => detail,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a query failed error
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an engine-specific error
    pub fn engine_error(engine: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Engine { engine: engine.into(), detail: detail.into() }
    }
}

/// Result type alias for duckgate operations
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(GatewayError::configuration("test").error_code(), "CONFIGURATION_ERROR");
        assert_eq!(GatewayError::connection_failed("test").error_code(), "CONNECTION_FAILED");
        assert_eq!(GatewayError::not_found("test").error_code(), "NOT_FOUND");
        assert_eq!(GatewayError::query_failed("test").error_code(), "QUERY_FAILED");
        assert_eq!(GatewayError::invalid_input("test").error_code(), "INVALID_INPUT");
        assert_eq!(GatewayError::engine_error("duckdb", "test").error_code(), "ENGINE_ERROR");
    }

    #[test]
    fn test_error_messages() {
        let err = GatewayError::configuration("token missing");
        assert!(err.message().contains("token missing"));

        let err = GatewayError::not_found("File not found: report");
        assert_eq!(err.message(), "File not found: report");

        let err = GatewayError::engine_error("duckdb", "extension load failed");
        assert!(err.message().contains("duckdb"));
        assert!(err.message().contains("extension load failed"));
    }

    #[test]
    fn test_error_detail_has_no_prefix() {
        let err = GatewayError::query_failed("Catalog Error: Table with name t does not exist!");
        assert_eq!(err.detail(), "Catalog Error: Table with name t does not exist!");
        assert!(err.message().starts_with("Query execution failed: "));
        assert_eq!(GatewayError::engine_error("duckdb", "boom").detail(), "boom");
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(GatewayError::configuration("x"), GatewayError::Configuration(_)));
        assert!(matches!(
            GatewayError::connection_failed("x"),
            GatewayError::ConnectionFailed(_)
        ));
        assert!(matches!(GatewayError::not_found("x"), GatewayError::NotFound(_)));
        assert!(matches!(GatewayError::query_failed("x"), GatewayError::QueryFailed(_)));
        assert!(matches!(GatewayError::invalid_input("x"), GatewayError::InvalidInput(_)));
        assert!(matches!(GatewayError::engine_error("a", "b"), GatewayError::Engine { .. }));
    }
}
