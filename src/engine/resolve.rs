//! Connection Target Resolution
//!
//! Classifies a raw database path into a backend mode. Pure: the only outside input is the
//! token environment variable, read through a lookup so callers can supply their own.
//!
//! | prefix   | mode          | engine path                                   |
//! |----------|---------------|-----------------------------------------------|
//! | `s3://`  | `ObjectStore` | unchanged                                     |
//! | `md:`    | `Remote`      | `?motherduck_token=<T>` (+ `&saas_mode=true`) |
//! | anything | `Local`       | unchanged (`:memory:` included)               |

use tracing::info;

use crate::config::TOKEN_ENV;
use crate::engine::{BackendMode, ConnectionTarget};
use crate::error::{GatewayError, Result};

/// Object-storage URI scheme
pub const OBJECT_STORE_PREFIX: &str = "s3://";

/// Managed-remote path marker
pub const REMOTE_PREFIX: &str = "md:";

/// In-memory database marker (treated as an ordinary local path)
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Resolve a raw path using the process environment for the fallback token
pub fn resolve(raw_path: &str, token: Option<&str>, saas_mode: bool) -> Result<ConnectionTarget> {
    resolve_with_env(raw_path, token, saas_mode, |name| std::env::var(name).ok())
}

/// Resolve a raw path with an explicit environment lookup
///
/// # Errors
/// Returns a configuration error for a remote path when neither `token` nor the
/// environment supplies an access token.
pub fn resolve_with_env(
    raw_path: &str,
    token: Option<&str>,
    saas_mode: bool,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ConnectionTarget> {
    let mode = if raw_path.starts_with(OBJECT_STORE_PREFIX) {
        BackendMode::ObjectStore { uri: raw_path.to_string() }
    } else if raw_path.starts_with(REMOTE_PREFIX) {
        let token = match token.filter(|t| !t.is_empty()) {
            Some(t) => {
                info!("Using access token argument for `{REMOTE_PREFIX}` database");
                t.to_string()
            }
            None => {
                let t = env(TOKEN_ENV).filter(|t| !t.is_empty()).ok_or_else(|| {
                    GatewayError::configuration(format!(
                        "Please set `{TOKEN_ENV}` as an environment variable or pass it with \
                         `--motherduck-token` when using `{REMOTE_PREFIX}` as db path"
                    ))
                })?;
                info!("Using access token from environment for `{REMOTE_PREFIX}` database");
                t
            }
        };

        let mut connection_string = format!("{raw_path}?motherduck_token={token}");
        if saas_mode {
            info!("Connecting to remote database in SaaS mode");
            connection_string.push_str("&saas_mode=true");
        }
        BackendMode::Remote { connection_string }
    } else {
        BackendMode::Local { path: raw_path.to_string() }
    };

    Ok(ConnectionTarget { raw_path: raw_path.to_string(), mode })
}
