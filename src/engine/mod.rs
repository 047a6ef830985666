//! Connection and Query Engine
//!
//! This module holds the core of duckgate: deciding which backend a database target
//! refers to, owning the live connection, and shaping query results.
//!
//! # Components
//! - [`resolve`] classifies a raw path into a [`ConnectionTarget`] (no I/O)
//! - [`manager`] owns the connection lifecycle for the resolved backend
//! - [`extension`] loads optional engine extensions and reports availability
//! - [`executor`] runs one statement and shapes the result
//!
//! # Connection Ownership
//! Exactly one [`manager::ConnectionManager`] exists per target. It either holds a single
//! persistent handle (serialized behind a mutex) or, for read-only local files, no handle at
//! all: every query then opens, runs and closes its own connection.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod executor;
pub mod extension;
pub mod manager;
pub mod resolve;

/// Engine name used in error reports
pub const ENGINE_NAME: &str = "duckdb";

/// Maximum number of rows returned by the structured shape
pub const MAX_STRUCTURED_ROWS: usize = 1000;

/// One result row: column name to JSON value, in engine column order
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Backend selected for a database target
///
/// Decided once at resolution time. Each variant carries the string handed to the engine.
#[derive(Clone, PartialEq, Eq)]
pub enum BackendMode {
    /// Local database file (including `:memory:`)
    Local { path: String },
    /// Managed remote warehouse (`md:`), token already appended
    Remote { connection_string: String },
    /// Database file in object storage (`s3://`), attached into an in-memory session
    ObjectStore { uri: String },
}

impl BackendMode {
    /// Get the backend name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local { .. } => "duckdb",
            Self::Remote { .. } => "motherduck",
            Self::ObjectStore { .. } => "s3",
        }
    }

    /// Path or connection string handed to the engine
    #[must_use]
    pub fn engine_path(&self) -> &str {
        match self {
            Self::Local { path } => path,
            Self::Remote { connection_string } => connection_string,
            Self::ObjectStore { uri } => uri,
        }
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { path } => f.debug_struct("Local").field("path", path).finish(),
            // connection string embeds the access token
            Self::Remote { .. } => f.debug_struct("Remote").finish_non_exhaustive(),
            Self::ObjectStore { uri } => f.debug_struct("ObjectStore").field("uri", uri).finish(),
        }
    }
}

/// Resolved database target, immutable once created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    /// Path exactly as supplied at startup
    pub raw_path: String,

    /// Selected backend and its engine path
    pub mode: BackendMode,
}

impl ConnectionTarget {
    /// Path handed to the engine (token-augmented for remote targets)
    #[must_use]
    pub fn resolved_path(&self) -> &str {
        self.mode.engine_path()
    }
}

/// Requested result contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultShape {
    /// Human-readable fixed-width text table
    Tabulated,
    /// JSON envelope with rows, columns, timing and truncation
    Structured,
}

/// Structured query result
///
/// Serialized with the wire field names agents expect
/// (`success`, `data`, `columns`, `rowCount`, `executionTime`, `truncated`, `query`, `error`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub success: bool,

    /// Result rows (capped at [`MAX_STRUCTURED_ROWS`])
    pub data: Vec<Record>,

    /// Column names in engine order
    pub columns: Vec<String>,

    /// Number of rows in `data`
    pub row_count: usize,

    /// Wall-clock execution time in whole milliseconds
    #[serde(rename = "executionTime")]
    pub execution_time_ms: u64,

    /// Whether rows beyond [`MAX_STRUCTURED_ROWS`] were dropped
    pub truncated: bool,

    /// Statement as executed
    pub query: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    /// Successful result; applies the row cap
    pub fn success(
        query: impl Into<String>,
        columns: Vec<String>,
        mut data: Vec<Record>,
        execution_time_ms: u64,
    ) -> Self {
        let truncated = data.len() > MAX_STRUCTURED_ROWS;
        if truncated {
            data.truncate(MAX_STRUCTURED_ROWS);
        }

        Self {
            success: true,
            row_count: data.len(),
            data,
            columns,
            execution_time_ms,
            truncated,
            query: query.into(),
            error: None,
        }
    }

    /// Failed result carrying the error text; never contains rows
    pub fn failure(query: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            columns: Vec::new(),
            row_count: 0,
            execution_time_ms: 0,
            truncated: false,
            query: query.into(),
            error: Some(error.into()),
        }
    }
}

/// Quote a value as a SQL string literal (single quotes doubled)
#[must_use]
pub fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
