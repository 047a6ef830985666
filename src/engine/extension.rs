//! Engine extension bootstrap
//!
//! Extensions are optional capabilities. [`ensure_extension`] reports whether one is usable
//! instead of failing, so a later query failure can be attributed to a missing extension.

use duckdb::{params, Connection};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Spreadsheet reader (`read_xlsx`)
pub const SPREADSHEET_EXTENSION: &str = "excel";

/// Remote filesystem (`s3://` and `https://` paths)
pub const REMOTE_FS_EXTENSION: &str = "httpfs";

/// Availability of the optional extensions on the persistent connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionStatus {
    pub spreadsheet: bool,
    pub remote_fs: bool,
}

/// Make an extension available on `conn`
///
/// Installs the extension only when the engine reports it missing (and `install` is set),
/// then loads it. Install and load failures are logged with the engine error.
///
/// Returns `true` when the extension is loaded afterwards.
pub fn ensure_extension(conn: &Connection, name: &str, install: bool) -> bool {
    let (installed, loaded) = match extension_state(conn, name) {
        Ok(state) => state,
        Err(e) => {
            debug!("Could not read extension catalog for {name}: {e}");
            (false, false)
        }
    };

    if loaded {
        return true;
    }

    if !installed {
        if !install {
            debug!("Extension {name} not installed and installation is disabled");
        } else if let Err(e) = conn.execute_batch(&format!("INSTALL {name};")) {
            warn!("Failed to install extension {name}: {e}");
        }
    }

    match conn.execute_batch(&format!("LOAD {name};")) {
        Ok(()) => {
            info!("Extension {name} loaded");
            true
        }
        Err(e) => {
            warn!("Extension {name} unavailable, dependent queries will fail: {e}");
            false
        }
    }
}

/// `(installed, loaded)` as reported by `duckdb_extensions()`
fn extension_state(conn: &Connection, name: &str) -> duckdb::Result<(bool, bool)> {
    let mut stmt = conn.prepare(
        "SELECT coalesce(installed, false), coalesce(loaded, false)
         FROM duckdb_extensions() WHERE extension_name = ?",
    )?;
    let mut rows = stmt.query(params![name])?;

    match rows.next()? {
        Some(row) => Ok((row.get(0)?, row.get(1)?)),
        None => Ok((false, false)),
    }
}
