//! duckgate - Tool-Call Gateway for DuckDB
//!
//! duckgate exposes a single logical database (a local DuckDB file, a MotherDuck warehouse or
//! a DuckDB file in S3) to AI agents through MCP tool calls, returning either a text table or
//! a structured JSON envelope.
//!
//! # Core Principles
//! - One connection owner per process, chosen once at startup
//! - Query failures are data (`"success": false`), not faults
//! - Read-only local mode uses short-lived connections so several clients can share a file
//! - Results are capped at 1000 rows and flagged when truncated
//!
//! # Module Organization
//! - [`error`] - Error types and handling
//! - [`config`] - Startup configuration and environment
//! - [`engine`] - Target resolution, connection lifecycle and query execution
//! - [`discovery`] - Spreadsheet structure discovery and type inference
//! - [`rewrite`] - File placeholder and sheet reference rewriting
//! - [`output`] - Response shaping
//! - [`mcp`] - JSON-RPC 2.0 tool server over stdio

pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod mcp;
pub mod output;
pub mod rewrite;

pub use config::{ConnectionConfig, ServerSettings, StorageCredentials};
pub use discovery::{
    ColumnProfile, DiscoveryReport, InferredType, SheetCatalog, SheetSchema, StructureDiscoverer,
    StructuredQuery, WorkbookCatalog,
};
pub use engine::executor::{QueryExecutor, QueryOutput};
pub use engine::extension::ExtensionStatus;
pub use engine::manager::{ConnectionManager, ConnectionStats};
pub use engine::resolve::resolve;
pub use engine::{BackendMode, ConnectionTarget, QueryResult, ResultShape};
pub use error::{GatewayError, Result};
pub use output::{ErrorEnvelope, ErrorInfo};
