//! Runtime configuration.
//!
//! Read from environment variables:
//! - `ALARM_DB_PATH` - Optional. JSON file holding the alarms. Defaults to `data/alarms.json`.
//! - `ALARM_LOG` - Optional. Log filter used when `RUST_LOG` is unset. Defaults to `info`.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::DEFAULT_DB_PATH;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Alarm collection file
    pub db_path: PathBuf,

    /// Default tracing filter directive
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let db_path = match lookup("ALARM_DB_PATH") {
            Some(path) if path.trim().is_empty() => {
                return Err(ConfigError::InvalidValue(
                    "ALARM_DB_PATH".to_string(),
                    "path is empty".to_string(),
                ));
            }
            Some(path) => PathBuf::from(path),
            None => defaults.db_path,
        };

        let log_filter = lookup("ALARM_LOG")
            .filter(|f| !f.trim().is_empty())
            .unwrap_or(defaults.log_filter);

        Ok(Self { db_path, log_filter })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.db_path, PathBuf::from("data/alarms.json"));
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("ALARM_DB_PATH", "/tmp/alarms.json"),
            ("ALARM_LOG", "alarm_tasks=debug"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/alarms.json"));
        assert_eq!(config.log_filter, "alarm_tasks=debug");
    }

    #[test]
    fn empty_path_is_invalid() {
        let err = Config::from_lookup(lookup_from(&[("ALARM_DB_PATH", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(var, _) if var == "ALARM_DB_PATH"));
    }
}
