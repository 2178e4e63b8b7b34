//! Configuration file handling for database connections.
//!
//! This module loads and parses `.docsql.json` configuration files. The
//! `database` object names the dialect and carries the connection options
//! inline.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::db::{DatabaseConfig, DbError};

/// Name of the configuration file looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".docsql.json";

/// Top-level configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Database configuration
    pub database: DatabaseConfig,
}

impl ConfigFile {
    /// Load configuration from `.docsql.json` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file doesn't exist
    /// - The file cannot be read
    /// - The JSON is invalid or required fields are missing
    pub fn load() -> Result<Self, DbError> {
        Self::load_optional()?.ok_or_else(|| DbError::Config {
            message: format!(
                "Configuration file not found: {name}\n\n\
                 Please create a {name} file in the current directory.\n\n\
                 Examples:\n\
                 \n\
                 MySQL:\n\
                 {{\n  \
                   \"database\": {{\n    \
                     \"dialect\": \"mysql\",\n    \
                     \"host\": \"localhost\",\n    \
                     \"dbname\": \"app\",\n    \
                     \"username\": \"app\",\n    \
                     \"password\": \"secret\"\n  \
                   }}\n\
                 }}\n\
                 \n\
                 PostgreSQL:\n\
                 {{\n  \
                   \"database\": {{\n    \
                     \"dialect\": \"postgres\",\n    \
                     \"host\": \"localhost\",\n    \
                     \"port\": 5432,\n    \
                     \"dbname\": \"app\",\n    \
                     \"username\": \"app\"\n  \
                   }}\n\
                 }}\n",
                name = CONFIG_FILE_NAME
            ),
        })
    }

    /// Load `.docsql.json` from the current directory if it exists.
    pub fn load_optional() -> Result<Option<Self>, DbError> {
        let path = PathBuf::from(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    /// Load and parse a configuration file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, DbError> {
        let content = fs::read_to_string(path).map_err(|e| DbError::Config {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;

        serde_json::from_str(&content).map_err(|e| DbError::Config {
            message: format!("Invalid JSON in {}: {}", path.display(), e),
        })
    }
}
