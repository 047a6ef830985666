//! Connection lifecycle
//!
//! [`ConnectionManager`] is constructed once per target and passed to everything that runs
//! queries. It owns at most one persistent engine handle:
//!
//! - Local, read-only: no persistent handle. Startup checks the file once, then every query
//!   opens a short-lived read-only connection so several processes can share the file.
//! - Local, writable: one persistent handle, spreadsheet extension loaded when available.
//! - Object store: in-memory session with the remote file attached as catalog `s3db`.
//! - Remote: one persistent handle on the token-augmented connection string.
//!
//! The persistent handle sits behind a mutex: one statement completes before the next starts.

use duckdb::{AccessMode, Config, Connection};
use serde::Serialize;
use std::ops::Deref;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error, info, warn};

use crate::config::{user_agent, ConnectionConfig, StorageCredentials};
use crate::engine::extension::{
    ensure_extension, ExtensionStatus, REMOTE_FS_EXTENSION, SPREADSHEET_EXTENSION,
};
use crate::engine::{sql_literal, BackendMode, ConnectionTarget, ENGINE_NAME};
use crate::error::{GatewayError, Result};

/// Catalog alias of the attached object-storage database
pub const OBJECT_STORE_ALIAS: &str = "s3db";

/// Name of the registered object-storage secret
pub const STORAGE_SECRET_NAME: &str = "s3_secret";

/// Connection held for the lifetime of the manager
pub enum LiveConnection {
    /// Single long-lived handle, access serialized
    Persistent(Mutex<Connection>),
    /// No handle: each query opens and closes its own
    Ephemeral,
}

/// Ephemeral connection lifecycle counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConnectionStats {
    /// Ephemeral connections opened since startup
    pub ephemeral_opened: u64,
    /// Ephemeral connections currently open
    pub ephemeral_live: u64,
}

#[derive(Default)]
struct Counters {
    opened: AtomicU64,
    live: AtomicU64,
}

/// Owner of the engine connection for one target
pub struct ConnectionManager {
    target: ConnectionTarget,
    config: ConnectionConfig,
    live: LiveConnection,
    extensions: Option<ExtensionStatus>,
    counters: Counters,
}

impl ConnectionManager {
    /// Establish the connection for `target`
    ///
    /// # Errors
    /// - Configuration error when object storage is combined with read-only mode
    /// - Connection error when the backend cannot be opened, checked or attached
    pub fn open(target: ConnectionTarget, config: ConnectionConfig) -> Result<Self> {
        info!("Connecting to {} database", target.mode);

        let (live, extensions) = match &target.mode {
            BackendMode::Local { path } if config.read_only => {
                (open_local_read_only(path, &config)?, None)
            }
            BackendMode::Local { path } => {
                let (live, extensions) = open_local(path, &config)?;
                (live, Some(extensions))
            }
            BackendMode::ObjectStore { uri } => {
                let (live, extensions) = open_object_store(uri, &config)?;
                (live, Some(extensions))
            }
            BackendMode::Remote { connection_string } => {
                (open_remote(connection_string, &config)?, None)
            }
        };

        info!("Connected to {} database", target.mode);

        Ok(Self { target, config, live, extensions, counters: Counters::default() })
    }

    /// Target this manager is connected to
    #[must_use]
    pub const fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    /// Whether queries run on short-lived per-call connections
    #[must_use]
    pub const fn is_ephemeral(&self) -> bool {
        matches!(self.live, LiveConnection::Ephemeral)
    }

    /// Extensions available on the persistent handle
    ///
    /// `None` when no bootstrap ran (read-only local and remote targets).
    #[must_use]
    pub const fn extensions(&self) -> Option<ExtensionStatus> {
        self.extensions
    }

    #[must_use]
    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            ephemeral_opened: self.counters.opened.load(Ordering::SeqCst),
            ephemeral_live: self.counters.live.load(Ordering::SeqCst),
        }
    }

    /// Run `f` against a connection
    ///
    /// Uses the persistent handle when one exists. Otherwise a fresh connection is opened for
    /// this call only and released on every exit path, including errors and panics in `f`.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        match &self.live {
            LiveConnection::Persistent(handle) => {
                // a panic mid-statement leaves the engine handle usable
                let conn = handle.lock().unwrap_or_else(PoisonError::into_inner);
                f(&conn)
            }
            LiveConnection::Ephemeral => {
                let conn = self.open_ephemeral()?;
                f(&conn)
            }
        }
    }

    /// Open a scoped connection to the read-only local target
    pub fn open_ephemeral(&self) -> Result<EphemeralConnection<'_>> {
        let conn =
            physical_connect(self.target.resolved_path(), self.config.read_only, &self.config)?;

        let id = self.counters.opened.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.live.fetch_add(1, Ordering::SeqCst);
        debug!("Opened ephemeral connection #{id}");

        Ok(EphemeralConnection { id, conn, counters: &self.counters })
    }
}

/// Connection scoped to a single query; closed when dropped
pub struct EphemeralConnection<'m> {
    id: u64,
    conn: Connection,
    counters: &'m Counters,
}

impl EphemeralConnection<'_> {
    /// Sequence number of this connection (1-based, unique per manager)
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl Deref for EphemeralConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl Drop for EphemeralConnection<'_> {
    fn drop(&mut self) {
        // the engine handle itself closes when `conn` is dropped right after this
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
        debug!("Closed ephemeral connection #{}", self.id);
    }
}

/// Engine settings shared by every physical connect
fn engine_config(read_only: bool, config: &ConnectionConfig) -> duckdb::Result<Config> {
    let mut engine = Config::default().with("custom_user_agent", &user_agent())?;

    if read_only {
        engine = engine.access_mode(AccessMode::ReadOnly)?;
    }
    if let Some(home) = config.home_dir.as_deref().and_then(Path::to_str) {
        engine = engine.with("home_directory", home)?;
    }

    Ok(engine)
}

/// Path safe to log (query parameters carry the access token)
fn display_path(path: &str) -> &str {
    path.split('?').next().unwrap_or(path)
}

/// Open one engine connection on `path`
fn physical_connect(path: &str, read_only: bool, config: &ConnectionConfig) -> Result<Connection> {
    let engine = engine_config(read_only, config).map_err(|e| {
        GatewayError::engine_error(ENGINE_NAME, format!("Invalid engine configuration: {e}"))
    })?;

    Connection::open_with_flags(path, engine).map_err(|e| {
        GatewayError::connection_failed(format!(
            "Failed to open database `{}`: {e}",
            display_path(path)
        ))
    })
}

/// Check the file once and keep no handle
fn open_local_read_only(path: &str, config: &ConnectionConfig) -> Result<LiveConnection> {
    let check = physical_connect(path, true, config)
        .and_then(|conn| {
            conn.execute_batch("SELECT 1").map_err(|e| {
                GatewayError::connection_failed(format!("Read-only check failed: {e}"))
            })?;
            Ok(conn)
        })
        .inspect_err(|e| error!("Read-only check failed: {e}"))?;
    drop(check);

    info!("Read-only mode: using short-lived connections per query");
    Ok(LiveConnection::Ephemeral)
}

fn open_local(path: &str, config: &ConnectionConfig) -> Result<(LiveConnection, ExtensionStatus)> {
    let conn = physical_connect(path, false, config)?;

    let extensions = ExtensionStatus {
        spreadsheet: ensure_extension(&conn, SPREADSHEET_EXTENSION, config.install_extensions),
        remote_fs: false,
    };

    Ok((LiveConnection::Persistent(Mutex::new(conn)), extensions))
}

fn open_remote(connection_string: &str, config: &ConnectionConfig) -> Result<LiveConnection> {
    let conn = physical_connect(connection_string, config.read_only, config)?;
    Ok(LiveConnection::Persistent(Mutex::new(conn)))
}

fn open_object_store(
    uri: &str,
    config: &ConnectionConfig,
) -> Result<(LiveConnection, ExtensionStatus)> {
    if config.read_only {
        return Err(GatewayError::configuration(
            "Read-only mode is not supported for S3 databases",
        ));
    }

    let engine = engine_config(false, config).map_err(|e| {
        GatewayError::engine_error(ENGINE_NAME, format!("Invalid engine configuration: {e}"))
    })?;
    let conn = Connection::open_in_memory_with_flags(engine).map_err(|e| {
        GatewayError::connection_failed(format!("Failed to open staging session: {e}"))
    })?;

    let extensions = ExtensionStatus {
        remote_fs: ensure_extension(&conn, REMOTE_FS_EXTENSION, config.install_extensions),
        spreadsheet: ensure_extension(&conn, SPREADSHEET_EXTENSION, config.install_extensions),
    };

    if let Some(credentials) = StorageCredentials::from_env() {
        register_storage_secret(&conn, &credentials)?;
    } else {
        debug!("No object-storage credentials in environment, relying on engine defaults");
    }

    attach_object_store(&conn, uri, config.read_only)?;

    Ok((LiveConnection::Persistent(Mutex::new(conn)), extensions))
}

/// Register storage credentials as a named secret (idempotent)
fn register_storage_secret(conn: &Connection, credentials: &StorageCredentials) -> Result<()> {
    let statement = format!(
        "CREATE SECRET IF NOT EXISTS {STORAGE_SECRET_NAME} (
            TYPE S3,
            KEY_ID {},
            SECRET {},
            REGION {}
        );",
        sql_literal(&credentials.key_id),
        sql_literal(&credentials.secret),
        sql_literal(&credentials.region),
    );

    conn.execute_batch(&statement).map_err(|e| {
        GatewayError::engine_error(ENGINE_NAME, format!("Failed to register storage secret: {e}"))
    })?;
    info!("Registered object-storage secret {STORAGE_SECRET_NAME}");
    Ok(())
}

/// Attach `uri` as the active catalog
///
/// Attaches read-only first. When the database does not exist and read-only was not
/// requested, attaches again writable so the engine creates it.
pub(crate) fn attach_object_store(conn: &Connection, uri: &str, read_only: bool) -> Result<()> {
    let location = sql_literal(uri);

    let Err(e) = conn.execute_batch(&format!(
        "ATTACH {location} AS {OBJECT_STORE_ALIAS} (READ_ONLY); USE {OBJECT_STORE_ALIAS};"
    )) else {
        info!("Attached {uri} as read-only catalog {OBJECT_STORE_ALIAS}");
        return Ok(());
    };

    error!("Failed to attach {uri}: {e}");
    if read_only || !e.to_string().contains("database does not exist") {
        return Err(GatewayError::connection_failed(format!("Failed to attach {uri}: {e}")));
    }

    warn!("Database {uri} does not exist, creating it");
    conn.execute_batch(&format!("ATTACH {location} AS {OBJECT_STORE_ALIAS}; USE {OBJECT_STORE_ALIAS};"))
        .map_err(|e| GatewayError::connection_failed(format!("Failed to create {uri}: {e}")))?;
    info!("Created new database at {uri}");
    Ok(())
}
