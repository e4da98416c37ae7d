//! Server configuration resolved from environment variables.
//!
//! # Invariants
//! - Blank values fall back to defaults.
//! - An unparsable port is a configuration error, never silently replaced.

use crate::error::ServerError;
use parasort_core::default_log_level;
use std::path::PathBuf;

pub const HOST_VAR: &str = "PARASORT_HOST";
pub const PORT_VAR: &str = "PARASORT_PORT";
pub const DB_PATH_VAR: &str = "PARASORT_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "PARASORT_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "PARASORT_LOG_DIR";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DB_FILE_NAME: &str = "parasort.sqlite3";

/// Runtime settings for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files; stderr when unset.
    pub log_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl ServerConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServerError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };
        let defaults = Self::default();

        let port = match value(PORT_VAR) {
            Some(raw) => raw.parse::<u16>().map_err(|err| {
                ServerError::Config(format!("{PORT_VAR} must be a port number, got `{raw}`: {err}"))
            })?,
            None => defaults.port,
        };

        Ok(Self {
            host: value(HOST_VAR).unwrap_or(defaults.host),
            port,
            db_path: value(DB_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            log_level: value(LOG_LEVEL_VAR).unwrap_or(defaults.log_level),
            log_dir: value(LOG_DIR_VAR),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ServerConfig, DB_PATH_VAR, HOST_VAR, LOG_DIR_VAR, PORT_VAR};
    use crate::error::ServerError;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert!(config.db_path.ends_with("parasort.sqlite3"));
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn explicit_values_override_defaults_and_blanks_do_not() {
        let config = ServerConfig::from_lookup(lookup(&[
            (HOST_VAR, " 0.0.0.0 "),
            (PORT_VAR, "9100"),
            (DB_PATH_VAR, "/var/lib/parasort/notes.db"),
            (LOG_DIR_VAR, "   "),
        ]))
        .unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9100);
        assert_eq!(config.db_path, PathBuf::from("/var/lib/parasort/notes.db"));
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn unparsable_port_is_rejected() {
        let err = ServerConfig::from_lookup(lookup(&[(PORT_VAR, "eighty")])).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
        assert!(err.to_string().contains("PARASORT_PORT"));
    }
}
