//! duckgate CLI Entry Point
//!
//! Three subcommands:
//! - `serve` - MCP tool server over stdio (default when no subcommand is given)
//! - `query` - Run one statement and print it as a table (or JSON with `--json`)
//! - `discover` - Print the structure report of a workbook
//!
//! Logs go to stderr so stdout stays clean for JSON-RPC and command output.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use duckgate::config::{DEFAULT_FILES_DIR, FILES_DIR_ENV};
use duckgate::discovery::{StructureDiscoverer, ALL_SHEETS, DEFAULT_SAMPLE_ROWS};
use duckgate::mcp::ToolServer;
use duckgate::output::{render_output, to_pretty_json, ErrorEnvelope};
use duckgate::{
    resolve, ConnectionConfig, ConnectionManager, ConnectionTarget, GatewayError, QueryExecutor,
    QueryOutput, ResultShape, ServerSettings,
};

/// duckgate - Tool-call gateway for DuckDB, MotherDuck and S3-attached databases
#[derive(Parser)]
#[command(name = "duckgate")]
#[command(about = "Tool-call gateway for a single DuckDB, MotherDuck or S3-attached database")]
#[command(version)]
struct Cli {
    /// Database path: a local file, `:memory:`, `md:[database]` or `s3://bucket/key`
    #[arg(long, global = true, default_value = "md:")]
    db_path: String,

    /// Access token for `md:` databases (falls back to the `motherduck_token` variable)
    #[arg(long, global = true)]
    motherduck_token: Option<String>,

    /// Engine home directory (extensions and secrets)
    #[arg(long, global = true)]
    home_dir: Option<PathBuf>,

    /// Connect to MotherDuck in SaaS mode
    #[arg(long, global = true)]
    saas_mode: bool,

    /// Open local files read-only with a short-lived connection per query
    #[arg(long, global = true)]
    read_only: bool,

    /// Only load extensions that are already installed
    #[arg(long, global = true)]
    offline: bool,

    /// Directory holding uploaded workbooks (`<fileId>.xlsx`)
    #[arg(long, global = true, env = FILES_DIR_ENV, default_value = DEFAULT_FILES_DIR)]
    files_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP tools over stdio
    Serve,

    /// Execute one SQL statement
    Query {
        /// SQL to execute
        sql: String,

        /// Print the structured JSON envelope instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the structure of a workbook
    Discover {
        /// Workbook path
        file: PathBuf,

        /// Sheet to analyze, `*` for all
        #[arg(long, default_value = ALL_SHEETS)]
        sheet: String,

        /// Number of sample rows per sheet
        #[arg(long, default_value_t = DEFAULT_SAMPLE_ROWS)]
        sample_rows: usize,
    },
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Serve => "serve",
            Self::Query { .. } => "query",
            Self::Discover { .. } => "discover",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("duckgate=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let command = cli.command.as_ref().map_or("serve", Commands::name);

    // the backend label is unknown until the path resolves
    let target = match resolve(&cli.db_path, cli.motherduck_token.as_deref(), cli.saas_mode) {
        Ok(target) => target,
        Err(e) => return report_failure("", command, &anyhow::Error::from(e)),
    };
    let engine = target.mode.as_str();

    match run(cli, target).await {
        Ok(code) => code,
        Err(e) => report_failure(engine, command, &e),
    }
}

/// Log the failure and, outside `serve`, print its error envelope
fn report_failure(engine: &str, command: &str, err: &anyhow::Error) -> ExitCode {
    error!("{command} failed: {err:#}");
    if let Some(envelope) = failure_envelope(engine, command, err) {
        if let Ok(json) = to_pretty_json(&envelope) {
            println!("{json}");
        }
    }
    ExitCode::FAILURE
}

/// Envelope for a command failure; `serve` keeps stdout for JSON-RPC only
fn failure_envelope(engine: &str, command: &str, err: &anyhow::Error) -> Option<ErrorEnvelope> {
    if command == "serve" {
        return None;
    }
    err.downcast_ref::<GatewayError>()
        .map(|gateway| ErrorEnvelope::from_error(engine, command, gateway))
}

async fn run(cli: Cli, target: ConnectionTarget) -> anyhow::Result<ExitCode> {
    let config = ConnectionConfig {
        read_only: cli.read_only,
        saas_mode: cli.saas_mode,
        home_dir: cli.home_dir,
        credential_token: cli.motherduck_token,
        install_extensions: !cli.offline,
    };
    info!("Starting duckgate {} on {} database", env!("CARGO_PKG_VERSION"), target.mode);

    let manager = tokio::task::spawn_blocking(move || ConnectionManager::open(target, config))
        .await
        .context("connection setup panicked")??;
    let executor = QueryExecutor::new(Arc::new(manager));

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            ToolServer::new(executor, ServerSettings::new(cli.files_dir)).serve().await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Query { sql, json } => {
            let shape = if json { ResultShape::Structured } else { ResultShape::Tabulated };
            let output = tokio::task::spawn_blocking(move || executor.execute(&sql, shape)).await??;
            println!("{}", render_output(&output)?);

            let failed = matches!(&output, QueryOutput::Structured(result) if !result.success);
            Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
        }
        Commands::Discover { file, sheet, sample_rows } => {
            let report = tokio::task::spawn_blocking(move || {
                StructureDiscoverer::with_workbooks(executor).discover(&file, &sheet, sample_rows)
            })
            .await?;
            println!("{}", to_pretty_json(&report)?);
            Ok(if report.success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}
