//! MCP (Model Context Protocol) Server
//!
//! This module implements an MCP server using manual JSON-RPC 2.0 over stdio.
//!
//! # Architecture
//!
//! - **Transport**: JSON-RPC 2.0 over stdio (line-based)
//! - **Protocol**: `initialize`, `ping`, `tools/list`, `tools/call`, `prompts/list`,
//!   `prompts/get`, `resources/list`; notifications get no reply
//! - **Execution**: engine calls run on the blocking pool so the stdio loop stays responsive
//!
//! # MCP Tools
//!
//! - `query` - Execute SQL, optionally against an uploaded workbook (`fileId`, `sheet`)
//! - `discover_structure` - Profile the sheets of an uploaded workbook
//!
//! Both tools return their result as pretty JSON text. Query and discovery failures are part
//! of that JSON (`"success": false`); only malformed calls become JSON-RPC errors.
//!
//! # Usage
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "duckgate": {
//!       "command": "duckgate",
//!       "args": ["--db-path", "/data/app.duckdb", "--read-only"]
//!     }
//!   }
//! }
//! ```

use anyhow::{anyhow, Result};
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::config::ServerSettings;
use crate::discovery::{DiscoveryReport, StructureDiscoverer, ALL_SHEETS, DEFAULT_SAMPLE_ROWS};
use crate::engine::executor::QueryExecutor;
use crate::engine::QueryResult;
use crate::error::GatewayError;
use crate::output::to_pretty_json;
use crate::rewrite::{file_path_for, rewrite_sheet_reference, substitute_file};

/// MCP protocol revision implemented here
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name of the starter prompt served by `prompts/get`
pub const INITIAL_PROMPT_NAME: &str = "duckdb-motherduck-initial-prompt";

const INITIAL_PROMPT_TEXT: &str = "\
You are connected to a DuckDB database through duckgate. The backend is either a local DuckDB \
file, a MotherDuck warehouse (md:) or a DuckDB file attached from S3 as catalog s3db.

Start by exploring what is there:
1. List schemas and tables with `SELECT * FROM information_schema.tables`.
2. Inspect a table with `DESCRIBE <table>` and preview it with `SELECT * FROM <table> LIMIT 5`.
3. For an uploaded spreadsheet, call `discover_structure` with its fileId before querying it.

Query with the `query` tool using DuckDB SQL. Results are JSON with success, data, columns, \
rowCount, executionTime and truncated; at most 1000 rows are returned, so aggregate or add \
LIMIT for large tables. With a fileId, `{{file}}` stands for the workbook path, and with a \
sheet, `FROM <sheet>` reads that sheet. Spreadsheet cells are read as text; cast them \
(for example `CAST(amount AS DOUBLE)`) before doing arithmetic.

When a query fails, read the error field, fix the SQL and try again. Summarize findings for \
the user in plain language and show the SQL you ran.";

// ============================================================================
// JSON-RPC 2.0 Structures
// ============================================================================

/// JSON-RPC 2.0 Request
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError { code, message, data: None }),
        }
    }
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

// ============================================================================
// MCP Tool Result Structures
// ============================================================================

/// Text content block for MCP tool results
#[derive(Debug, Serialize)]
struct TextContent {
    #[serde(rename = "type")]
    content_type: String,
    text: String,
}

impl TextContent {
    fn new(text: String) -> Self {
        Self { content_type: "text".to_string(), text }
    }
}

/// MCP tool call result
#[derive(Debug, Serialize)]
struct CallToolResult {
    content: Vec<TextContent>,
    #[serde(rename = "isError")]
    is_error: bool,
}

impl CallToolResult {
    /// Tool result carrying `data` as pretty JSON text
    fn success(data: &impl Serialize) -> Result<Value> {
        let json_text = to_pretty_json(data)?;
        let result = Self { content: vec![TextContent::new(json_text)], is_error: false };
        Ok(serde_json::to_value(result)?)
    }
}

// ============================================================================
// Tool Arguments
// ============================================================================

/// Arguments of the `query` tool
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryArgs {
    /// SQL query to execute (DuckDB dialect). Use {{file}} or the sheet name directly in the
    /// FROM clause.
    pub query: String,

    /// Optional file ID of an uploaded Excel file.
    #[serde(default)]
    pub file_id: Option<String>,

    /// Optional sheet name; `FROM <sheet>` is rewritten to read that sheet of the file.
    #[serde(default)]
    pub sheet: Option<String>,
}

/// Arguments of the `discover_structure` tool
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverArgs {
    /// File ID of the uploaded Excel file.
    pub file_id: String,

    /// Sheet name to analyze, or '*' for all sheets.
    #[serde(default = "default_sheet")]
    pub sheet: String,

    /// Number of sample rows to return.
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
}

fn default_sheet() -> String {
    ALL_SHEETS.to_string()
}

const fn default_sample_rows() -> usize {
    DEFAULT_SAMPLE_ROWS
}

fn input_schema<T: JsonSchema>() -> Result<Value> {
    let mut schema = serde_json::to_value(schema_for!(T))?;
    if let Some(object) = schema.as_object_mut() {
        object.remove("$schema");
        object.remove("title");
    }
    Ok(schema)
}

// ============================================================================
// MCP Server
// ============================================================================

/// Tool dispatcher bound to one executor and one files directory
#[derive(Clone)]
pub struct ToolServer {
    executor: QueryExecutor,
    settings: ServerSettings,
}

impl ToolServer {
    pub const fn new(executor: QueryExecutor, settings: ServerSettings) -> Self {
        Self { executor, settings }
    }

    /// Run the stdio loop until stdin closes
    ///
    /// Each request is one line of JSON; each response is written as one line.
    ///
    /// # Errors
    ///
    /// Returns an error if stdio communication fails.
    pub async fn serve(self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        info!("Serving tools over stdio");
        while let Some(line) = lines.next_line().await? {
            let Some(response) = self.handle_line(&line).await else {
                continue;
            };
            stdout.write_all(response.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        info!("stdin closed, shutting down");

        Ok(())
    }

    /// Handle one line of input; `None` when no reply is due
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        if line.trim().is_empty() {
            return None;
        }

        let response = match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request).await?,
            Err(e) => JsonRpcResponse::error(None, -32700, format!("Parse error: {e}")),
        };

        match serde_json::to_string(&response) {
            Ok(json) => Some(json),
            Err(e) => {
                error!("Failed to serialize response: {e}");
                None
            }
        }
    }

    /// Route the request to the appropriate handler
    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.id.is_none() && request.method.starts_with("notifications/") {
            debug!("Notification: {}", request.method);
            return None;
        }

        let result = match request.method.as_str() {
            "initialize" => handle_initialize(),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => handle_list_tools(),
            "tools/call" => self.handle_call_tool(request.params).await,
            "prompts/list" => Ok(handle_list_prompts()),
            "prompts/get" => handle_get_prompt(request.params.as_ref()),
            "resources/list" => {
                debug!("No resources available to list");
                Ok(serde_json::json!({ "resources": [] }))
            }
            _ => {
                return Some(JsonRpcResponse::error(
                    request.id,
                    -32601,
                    format!("Method not found: {}", request.method),
                ))
            }
        };

        Some(match result {
            Ok(value) => JsonRpcResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id,
                result: Some(value),
                error: None,
            },
            Err(e) => JsonRpcResponse::error(request.id, -32603, e.to_string()),
        })
    }

    /// Handle tools/call request
    async fn handle_call_tool(&self, params: Option<Value>) -> Result<Value> {
        let params = params.ok_or_else(|| anyhow!("Missing params"))?;
        let name = params["name"].as_str().ok_or_else(|| anyhow!("Missing tool name"))?;
        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
        info!("Tool received: {name}");

        match name {
            "query" => {
                let args: QueryArgs = serde_json::from_value(arguments)
                    .map_err(|e| GatewayError::invalid_input(format!("Invalid query arguments: {e}")))?;
                let server = self.clone();
                let result = tokio::task::spawn_blocking(move || server.query(&args)).await?;
                info!("Query executed: {} rows", result.row_count);
                CallToolResult::success(&result)
            }
            "discover_structure" => {
                let args: DiscoverArgs = serde_json::from_value(arguments).map_err(|e| {
                    GatewayError::invalid_input(format!("Invalid discover_structure arguments: {e}"))
                })?;
                let server = self.clone();
                let report = tokio::task::spawn_blocking(move || server.discover(&args)).await??;
                CallToolResult::success(&report)
            }
            _ => Err(anyhow!("Unsupported tool: {name}")),
        }
    }

    /// Tool `query`: rewrite for the referenced workbook, then execute structured
    pub fn query(&self, args: &QueryArgs) -> QueryResult {
        let Some(file_id) = args.file_id.as_deref().filter(|id| !id.is_empty()) else {
            return self.executor.structured(&args.query);
        };

        let path = match self.locate_file(file_id) {
            Ok(path) => path,
            Err(e) => {
                warn!("{e}");
                return QueryResult::failure(&args.query, e.message());
            }
        };

        let query = match args.sheet.as_deref().filter(|s| !s.is_empty()) {
            Some(sheet) => {
                info!("Executing query with sheet: {sheet}");
                match rewrite_sheet_reference(&args.query, &path, sheet) {
                    Ok(query) => query,
                    Err(e) => return QueryResult::failure(&args.query, e.message()),
                }
            }
            None => substitute_file(&args.query, &path),
        };

        info!("Executing query with file: {path}");
        self.executor.structured(&query)
    }

    /// Tool `discover_structure`
    ///
    /// # Errors
    /// Returns an invalid-input error when `fileId` is empty.
    pub fn discover(&self, args: &DiscoverArgs) -> crate::error::Result<DiscoveryReport> {
        if args.file_id.is_empty() {
            return Err(GatewayError::invalid_input("fileId is required"));
        }

        let path = file_path_for(&self.settings.files_dir, &args.file_id);
        info!("Discovering structure for file: {}, sheet: {}", args.file_id, args.sheet);

        let discoverer = StructureDiscoverer::with_workbooks(self.executor.clone());
        Ok(discoverer.discover(Path::new(&path), &args.sheet, args.sample_rows))
    }

    /// Path of an uploaded workbook that must exist
    fn locate_file(&self, file_id: &str) -> crate::error::Result<String> {
        let path = file_path_for(&self.settings.files_dir, file_id);
        if Path::new(&path).exists() {
            return Ok(path);
        }

        match std::fs::read_dir(&self.settings.files_dir) {
            Ok(entries) => {
                let names: Vec<String> = entries
                    .filter_map(std::result::Result::ok)
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .collect();
                debug!("Files in {}: {names:?}", self.settings.files_dir.display());
            }
            Err(e) => debug!("Cannot list {}: {e}", self.settings.files_dir.display()),
        }

        Err(GatewayError::not_found(format!("File not found: {file_id}")))
    }
}

// ============================================================================
// MCP Protocol Handlers
// ============================================================================

/// Returns server capabilities and metadata.
fn handle_initialize() -> Result<Value> {
    Ok(serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {},
            "prompts": {},
            "resources": {}
        },
        "serverInfo": {
            "name": crate::config::SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

/// Returns the starter prompt listing.
fn handle_list_prompts() -> Value {
    info!("Listing prompts");
    serde_json::json!({
        "prompts": [
            {
                "name": INITIAL_PROMPT_NAME,
                "description": "A prompt to initialize a connection to duckdb or motherduck and start working with it"
            }
        ]
    })
}

/// Returns the starter prompt as a single user message.
fn handle_get_prompt(params: Option<&Value>) -> Result<Value> {
    let name = params
        .and_then(|p| p["name"].as_str())
        .ok_or_else(|| anyhow!("Missing prompt name"))?;
    info!("Getting prompt: {name}");

    if name != INITIAL_PROMPT_NAME {
        return Err(anyhow!("Unknown prompt: {name}"));
    }

    Ok(serde_json::json!({
        "description": "Initial prompt for interacting with DuckDB/MotherDuck",
        "messages": [
            {
                "role": "user",
                "content": serde_json::to_value(TextContent::new(INITIAL_PROMPT_TEXT.to_string()))?
            }
        ]
    }))
}

/// Returns the list of available MCP tools with their schemas.
fn handle_list_tools() -> Result<Value> {
    Ok(serde_json::json!({
        "tools": [
            {
                "name": "query",
                "description": "Execute a SQL query on the DuckDB or MotherDuck database. Returns JSON with success, data, columns, rowCount, executionTime (ms), truncated (more than 1000 rows) and error. With fileId, {{file}} is replaced by the uploaded workbook path; with fileId and sheet, FROM <sheet> reads that sheet.",
                "inputSchema": input_schema::<QueryArgs>()?
            },
            {
                "name": "discover_structure",
                "description": "Discover schema and structure of Excel sheets with sample data. Returns per-sheet columns (name, type, distinctCount, nonNullCount), total rowCount and sampleData.",
                "inputSchema": input_schema::<DiscoverArgs>()?
            }
        ]
    }))
}
