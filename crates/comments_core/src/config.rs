//! Process-level configuration.
//!
//! # Responsibility
//! - Hold database location and logging settings for one process.
//! - Bootstrap logging and the database connection in a fixed order.

use crate::db::{open_db, DbError};
use crate::logging::{default_log_level, init_logging};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DEFAULT_DB_FILE_NAME: &str = "comments.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite database file; created on first open.
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` disables file logs.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Logging(String),
    Db(DbError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(message) => write!(f, "logging setup failed: {message}"),
            Self::Db(err) => write!(f, "database setup failed: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(_) => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for ConfigError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl CoreConfig {
    /// Starts logging (when a directory is set), then opens the migrated
    /// database.
    pub fn bootstrap(&self) -> Result<Connection, ConfigError> {
        if let Some(log_dir) = self.log_dir.as_deref() {
            init_logging(&self.log_level, log_dir).map_err(ConfigError::Logging)?;
        }
        Ok(open_db(&self.db_path)?)
    }
}
