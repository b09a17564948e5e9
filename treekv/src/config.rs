//! Store configuration module.
//!
//! This module provides configuration loading for the store from
//! environment variables.
//!
//! # Environment Variables
//!
//! - `TREEKV_DATA_DIRECTORY`: Directory holding the store files (default: `.`)
//! - `TREEKV_INDEX_FILE`: Index Store file name (default: `index.txt`)
//! - `TREEKV_DATA_FILE`: Value Heap file name (default: `data.txt`)

use std::path::{Path, PathBuf};

/// Where the store's two files live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding both files. Created on open if missing.
    pub data_directory: PathBuf,
    /// File name of the Index Store within `data_directory`.
    pub index_file: String,
    /// File name of the Value Heap within `data_directory`.
    pub data_file: String,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl StoreConfig {
    /// Default data directory (the working directory).
    pub const DEFAULT_DATA_DIRECTORY: &'static str = ".";
    /// Default Index Store file name.
    pub const DEFAULT_INDEX_FILE: &'static str = "index.txt";
    /// Default Value Heap file name.
    pub const DEFAULT_DATA_FILE: &'static str = "data.txt";

    /// Default file names inside `data_directory`.
    #[must_use]
    pub fn new(data_directory: &Path) -> Self {
        Self {
            data_directory: data_directory.to_path_buf(),
            index_file: Self::DEFAULT_INDEX_FILE.to_string(),
            data_file: Self::DEFAULT_DATA_FILE.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value if set.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let load = |name: &str, default: &str| -> Result<String, ConfigError> {
            match lookup(name) {
                Some(value) if value.is_empty() => Err(ConfigError::InvalidValue {
                    name: name.to_string(),
                    message: "must not be empty".to_string(),
                }),
                Some(value) => Ok(value),
                None => Ok(default.to_string()),
            }
        };

        Ok(Self {
            data_directory: PathBuf::from(load(
                "TREEKV_DATA_DIRECTORY",
                Self::DEFAULT_DATA_DIRECTORY,
            )?),
            index_file: load("TREEKV_INDEX_FILE", Self::DEFAULT_INDEX_FILE)?,
            data_file: load("TREEKV_DATA_FILE", Self::DEFAULT_DATA_FILE)?,
        })
    }

    /// Full path of the Index Store.
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.data_directory.join(&self.index_file)
    }

    /// Full path of the Value Heap.
    #[must_use]
    pub fn heap_path(&self) -> PathBuf {
        self.data_directory.join(&self.data_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_values() {
        let config = StoreConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, StoreConfig::new(Path::new(".")));
        assert_eq!(config.index_path(), PathBuf::from("./index.txt"));
        assert_eq!(config.heap_path(), PathBuf::from("./data.txt"));
    }

    #[test]
    fn test_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("TREEKV_DATA_DIRECTORY", "/var/lib/treekv"),
            ("TREEKV_INDEX_FILE", "tree.idx"),
        ]))
        .expect("config");
        assert_eq!(config.index_path(), PathBuf::from("/var/lib/treekv/tree.idx"));
        assert_eq!(config.heap_path(), PathBuf::from("/var/lib/treekv/data.txt"));
    }

    #[test]
    fn test_empty_value_is_rejected() {
        let result = StoreConfig::from_lookup(lookup(&[("TREEKV_DATA_FILE", "")]));
        assert_eq!(
            result,
            Err(ConfigError::InvalidValue {
                name: "TREEKV_DATA_FILE".to_string(),
                message: "must not be empty".to_string(),
            })
        );
    }

    #[test]
    fn test_config_error_display_invalid() {
        let error = ConfigError::InvalidValue {
            name: "TEST_VAR".to_string(),
            message: "bad value".to_string(),
        };
        assert_eq!(error.to_string(), "invalid value for TEST_VAR: bad value");
    }
}
