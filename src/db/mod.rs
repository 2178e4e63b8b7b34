//! Relational storage layer for JSON documents.
//!
//! This module provides everything below the document-store API:
//! - The `Connection` capability (statement execution against MySQL or PostgreSQL)
//! - Value encoding/decoding and SQL literal escaping
//! - Table-per-collection bootstrap (`SchemaManager`)
//! - Connection configuration (URLs, environment, config file)
//!
//! # Architecture
//!
//! Every collection is one table holding an integer identity column `id` and a
//! JSON (MySQL) or JSONB (PostgreSQL) column `document`. The dialect-specific SQL
//! vocabulary lives in `crate::queries::builder::compilers`; this module only
//! executes what the grammar produces.
//!
//! # Type Decisions
//!
//! **Why text cells in `Row` instead of typed values?**
//! The only values read back are the document column, row counts and
//! existence-check results. All of them travel as text in both dialects, so
//! rows are `Vec<Option<String>>` and decoding happens in `value.rs`.

mod config;
mod connection;
mod escape;
mod schema;
mod value;

pub use config::{ConnectionOptions, DatabaseConfig};
pub use connection::{open_connection, Connection, Row};
pub use escape::{escape_like, escape_mysql_string, escape_postgres_string};
pub use schema::SchemaManager;
pub use value::{
    decode, decode_document, documents_from_value, encode, encode_document, is_truthy, type_name,
    Document,
};

use thiserror::Error;

/// Database error types
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to connect to {backend}: {message}")]
    ConnectFailed { backend: String, message: String },

    #[error("Unsupported server: {message}")]
    UnsupportedServer { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to create table for collection '{collection}': {message}")]
    SchemaFailed { collection: String, message: String },

    #[error("Operator {operator} not supported by database driver")]
    UnsupportedOperator { operator: String },

    #[error("Invalid argument for {operator}: {message}")]
    MalformedOperand { operator: String, message: String },

    #[error("Invalid value type {type_name} for SQL literal")]
    InvalidValue { type_name: &'static str },

    #[error("Query failed: {message}")]
    QueryFailed { message: String },

    #[error("Collection '{collection}' has been dropped")]
    CollectionDropped { collection: String },

    #[error("Failed to acquire lock: {message}")]
    LockPoisoned { message: String },

    #[error("Stored document is not a JSON object: {found}")]
    InvalidDocument { found: &'static str },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<postgres::Error> for DbError {
    fn from(e: postgres::Error) -> Self {
        // Display is only "db error" for server-side failures
        let message = match e.as_db_error() {
            Some(db) => format!("{} (SQLSTATE {})", db.message(), db.code().code()),
            None => e.to_string(),
        };
        DbError::QueryFailed { message }
    }
}

impl<T> From<std::sync::PoisonError<T>> for DbError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DbError::LockPoisoned {
            message: e.to_string(),
        }
    }
}
