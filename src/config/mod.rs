//! Configuration Management
//!
//! This module holds the startup configuration shared read-only by every component.
//! Nothing here is mutated after the server starts.
//!
//! # Sources
//! 1. CLI flags (highest priority)
//! 2. Environment variables (`motherduck_token`, `EXCEL_FILES_PATH`, `AWS_*`)
//! 3. Built-in defaults
//!
//! Sensitive values (access token, storage secret) are redacted from `Debug` output.

use std::fmt;
use std::path::PathBuf;

/// Environment variable holding the managed-remote access token
pub const TOKEN_ENV: &str = "motherduck_token";

/// Environment variable pointing at the directory that holds uploaded spreadsheets
pub const FILES_DIR_ENV: &str = "EXCEL_FILES_PATH";

/// Default spreadsheet directory when `EXCEL_FILES_PATH` is not set
pub const DEFAULT_FILES_DIR: &str = "/app/excel_files";

/// Object-storage access key id
pub const ACCESS_KEY_ENV: &str = "AWS_ACCESS_KEY_ID";

/// Object-storage secret key
pub const SECRET_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";

/// Object-storage default region
pub const REGION_ENV: &str = "AWS_DEFAULT_REGION";

/// Region used when `AWS_DEFAULT_REGION` is absent
pub const DEFAULT_REGION: &str = "us-east-1";

/// Service name reported to the backend on every physical connect
pub const SERVICE_NAME: &str = "duckgate";

/// Client identifier attached to every physical connect (`duckgate/<version>`)
#[must_use]
pub fn user_agent() -> String {
    format!("{SERVICE_NAME}/{}", env!("CARGO_PKG_VERSION"))
}

/// Connection configuration supplied once at startup
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Open local files read-only with short-lived per-query connections
    pub read_only: bool,

    /// Connect to the managed remote service in SaaS mode
    pub saas_mode: bool,

    /// Engine home directory (extension and secret storage)
    pub home_dir: Option<PathBuf>,

    /// Managed-remote access token
    /// WARNING: Sensitive data, do not log or include in error messages
    pub credential_token: Option<String>,

    /// Install missing extensions over the network before loading them.
    /// When false only already-installed extensions are loaded.
    pub install_extensions: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            read_only: false,
            saas_mode: false,
            home_dir: None,
            credential_token: None,
            install_extensions: true,
        }
    }
}

impl ConnectionConfig {
    /// Read-only configuration (ephemeral connections for local files)
    #[must_use]
    pub fn read_only() -> Self {
        Self { read_only: true, ..Default::default() }
    }

    /// Same configuration with network extension installation disabled
    #[must_use]
    pub fn offline(self) -> Self {
        Self { install_extensions: false, ..self }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("read_only", &self.read_only)
            .field("saas_mode", &self.saas_mode)
            .field("home_dir", &self.home_dir)
            .field("credential_token", &self.credential_token.as_ref().map(|_| "<redacted>"))
            .field("install_extensions", &self.install_extensions)
            .finish()
    }
}

/// Object-storage credentials registered as an engine secret
#[derive(Clone, PartialEq, Eq)]
pub struct StorageCredentials {
    pub key_id: String,
    pub secret: String,
    pub region: String,
}

impl StorageCredentials {
    /// Read credentials from the process environment
    ///
    /// Returns `None` unless both the key id and the secret are present.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let key_id = lookup(ACCESS_KEY_ENV).filter(|v| !v.is_empty())?;
        let secret = lookup(SECRET_KEY_ENV).filter(|v| !v.is_empty())?;
        let region = lookup(REGION_ENV)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Some(Self { key_id, secret, region })
    }
}

impl fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("key_id", &self.key_id)
            .field("secret", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

/// Dispatcher settings (where uploaded spreadsheets live)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub files_dir: PathBuf,
}

impl ServerSettings {
    /// Settings with an explicit files directory
    pub fn new(files_dir: impl Into<PathBuf>) -> Self {
        Self { files_dir: files_dir.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ConnectionConfig::default();
        assert!(!config.read_only);
        assert!(!config.saas_mode);
        assert!(config.home_dir.is_none());
        assert!(config.credential_token.is_none());
        assert!(config.install_extensions);
    }

    #[test]
    fn test_read_only_offline() {
        let config = ConnectionConfig::read_only().offline();
        assert!(config.read_only);
        assert!(!config.install_extensions);
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ConnectionConfig {
            credential_token: Some("super-secret-token".to_string()),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_user_agent_carries_version() {
        let agent = user_agent();
        assert!(agent.starts_with("duckgate/"));
        assert!(agent.ends_with(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_storage_credentials_complete() {
        let creds = StorageCredentials::from_lookup(lookup_from(&[
            (ACCESS_KEY_ENV, "AKIA123"),
            (SECRET_KEY_ENV, "shh"),
            (REGION_ENV, "eu-west-1"),
        ]))
        .expect("credentials should resolve");

        assert_eq!(creds.key_id, "AKIA123");
        assert_eq!(creds.secret, "shh");
        assert_eq!(creds.region, "eu-west-1");
        assert!(!format!("{creds:?}").contains("shh"));
    }

    #[test]
    fn test_storage_credentials_default_region() {
        let creds = StorageCredentials::from_lookup(lookup_from(&[
            (ACCESS_KEY_ENV, "AKIA123"),
            (SECRET_KEY_ENV, "shh"),
        ]))
        .unwrap();
        assert_eq!(creds.region, DEFAULT_REGION);
    }

    #[test]
    fn test_storage_credentials_require_key_and_secret() {
        assert!(StorageCredentials::from_lookup(lookup_from(&[(ACCESS_KEY_ENV, "AKIA")])).is_none());
        assert!(StorageCredentials::from_lookup(lookup_from(&[(SECRET_KEY_ENV, "shh")])).is_none());
        assert!(StorageCredentials::from_lookup(lookup_from(&[])).is_none());
    }

    #[test]
    fn test_server_settings_files_dir() {
        let settings = ServerSettings::new("/srv/uploads");
        assert_eq!(settings.files_dir, PathBuf::from("/srv/uploads"));
    }
}
