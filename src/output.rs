//! Response Shaping
//!
//! Turns core results into the text handed back to callers (tool-call content blocks and CLI
//! stdout). Results themselves ([`QueryResult`](crate::engine::QueryResult),
//! [`DiscoveryReport`](crate::discovery::DiscoveryReport)) already carry their wire field
//! names; this module only renders them and wraps errors that escaped the core.
//!
//! # Error Contract
//! `{"success": false, "engine": "...", "command": "...", "error": {"code": "...", "message": "..."}}`

use serde::{Deserialize, Serialize};

use crate::engine::executor::QueryOutput;
use crate::error::GatewayError;

/// Error envelope for failures that are not already reported as data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always false
    pub success: bool,

    /// Backend the failure came from (`duckdb`, `motherduck`, `s3`), empty before resolution
    pub engine: String,

    /// Command or tool that was attempted
    pub command: String,

    pub error: ErrorInfo,
}

impl ErrorEnvelope {
    pub fn new(engine: impl Into<String>, command: impl Into<String>, error: ErrorInfo) -> Self {
        Self { success: false, engine: engine.into(), command: command.into(), error }
    }

    /// Create error envelope from a [`GatewayError`]
    pub fn from_error(
        engine: impl Into<String>,
        command: impl Into<String>,
        err: &GatewayError,
    ) -> Self {
        Self::new(engine, command, ErrorInfo::from(err))
    }
}

/// Error information structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error code (e.g., "NOT_FOUND", "CONNECTION_FAILED")
    pub code: String,

    /// Human-readable error message (no credentials)
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }
}

impl From<&GatewayError> for ErrorInfo {
    fn from(err: &GatewayError) -> Self {
        Self::new(err.error_code(), err.message())
    }
}

/// Pretty-printed JSON (two-space indent)
pub fn to_pretty_json(value: &impl Serialize) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// Text form of a query result: tables as-is, envelopes as pretty JSON
pub fn render_output(output: &QueryOutput) -> serde_json::Result<String> {
    match output {
        QueryOutput::Text(table) => Ok(table.clone()),
        QueryOutput::Structured(result) => to_pretty_json(result),
    }
}
