use crate::errors::DbError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Options for opening a database.
///
/// Pagination is deliberately not configured here: page number and size are
/// explicit parameters of every list call, never ambient state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseOptions {
    /// Path of the write-ahead log file backing the store.
    pub path: PathBuf,
    /// Fsync the WAL after every append instead of on flush/drop.
    pub flush_each_write: bool,
    /// Mirror log output into a per-database file.
    pub log_to_file: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from("coursedb.db"),
            flush_each_write: false,
            log_to_file: false,
        }
    }
}

impl DatabaseOptions {
    #[must_use]
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// # Errors
    /// Returns `DbError::Config` when the file is unreadable or not valid TOML.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let raw = std::fs::read_to_string(path).map_err(|e| DbError::Config(e.to_string()))?;
        toml::from_str(&raw).map_err(|e| DbError::Config(e.to_string()))
    }
}
