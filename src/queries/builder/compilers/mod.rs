//! Dialect-specific SQL vocabulary.
//!
//! Provides an abstraction layer for dialect-specific syntax generation, so
//! the predicate compiler and query builder are written once and compile to
//! either MySQL (`JSON` columns) or PostgreSQL (`jsonb` columns).

pub mod mysql;
pub mod postgres;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::DbError;

pub use mysql::MysqlGrammar;
pub use postgres::PostgresGrammar;

/// Supported relational-JSON backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Mysql,
    Postgres,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Mysql => write!(f, "mysql"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for Dialect {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(Dialect::Mysql),
            "postgres" | "postgresql" | "pgsql" => Ok(Dialect::Postgres),
            other => Err(DbError::Config {
                message: format!("Unknown dialect '{}': expected mysql or postgres", other),
            }),
        }
    }
}

/// Trait for dialect-specific SQL generation.
///
/// Every method is pure: it renders SQL text and never touches a connection.
/// `field` arguments are dotted document paths such as `"author.name"`.
pub trait DialectGrammar: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Quote a table or column name.
    fn quote_identifier(&self, name: &str) -> String;

    /// Quote a string as a single-quoted literal.
    fn quote_string(&self, s: &str) -> String;

    /// Quote a scalar JSON value as a literal comparable with the text selector.
    ///
    /// # Errors
    /// Arrays and objects have no scalar literal form and yield `DbError::InvalidValue`.
    fn quote_literal(&self, value: &Value) -> Result<String, DbError>;

    /// Serialise a whole value and cast it to the dialect's JSON type.
    fn json_literal(&self, value: &Value) -> Result<String, DbError>;

    /// The path literal addressing `field` inside the document column.
    ///
    /// For example:
    /// - MySQL: `path_expression("a.b")` -> `'$.a.b'`
    /// - PostgreSQL: `path_expression("a.b")` -> `'{a,b}'`
    fn path_expression(&self, field: &str) -> String;

    /// Extract `field` as text (SQL NULL when absent).
    fn text_selector(&self, field: &str) -> String;

    /// Extract `field` as a JSON value (SQL NULL when absent).
    fn json_selector(&self, field: &str) -> String;

    /// `field` is absent or JSON null (`is_null`), or holds a non-null value.
    fn null_check_sql(&self, field: &str, is_null: bool) -> String;

    /// Array at `field` contains the scalar `value`.
    fn contains_sql(&self, field: &str, value: &Value) -> Result<String, DbError>;

    /// Array at `field` contains every element of `values` (non-empty).
    fn contains_all_sql(&self, field: &str, values: &[Value]) -> Result<String, DbError>;

    /// Case-insensitive regular-expression match.
    fn regex_sql(&self, field: &str, pattern: &str) -> String;

    /// Array at `field` has exactly `length` elements.
    fn array_length_sql(&self, field: &str, length: i64) -> String;

    /// Integer value at `field` modulo `divisor` equals `remainder`.
    fn modulo_sql(&self, field: &str, divisor: i64, remainder: i64) -> String;

    /// Text at `field` contains `needle` literally.
    fn like_sql(&self, field: &str, needle: &str) -> String;

    /// Query returning a non-null first cell iff `table` exists.
    fn exists_check_sql(&self, table: &str) -> String;

    /// Statements creating the table for one collection, in order.
    fn create_table_sql(&self, table: &str) -> Vec<String>;

    fn drop_table_sql(&self, table: &str) -> String;

    /// Statements renaming a collection table, in order.
    fn rename_table_sql(&self, from: &str, to: &str) -> Vec<String>;

    /// Condition selecting the row whose document `_id` equals `id`.
    fn id_predicate(&self, id: &str) -> String;

    /// Bound parameter carrying a whole JSON document (1-based `index`).
    fn document_placeholder(&self, index: usize) -> String;

    /// LIMIT operand meaning "no limit", needed when only OFFSET is wanted.
    fn unbounded_limit(&self) -> &'static str;

    /// Query returning the server version string.
    fn server_version_sql(&self) -> &'static str;

    /// Oldest server version with every feature the grammar relies on.
    fn min_server_version(&self) -> (u32, u32, u32);

    /// Statements run once after connecting.
    fn session_init_sql(&self) -> Vec<String>;
}

/// Get the grammar for a dialect.
pub fn grammar_for(dialect: Dialect) -> Arc<dyn DialectGrammar> {
    match dialect {
        Dialect::Mysql => Arc::new(MysqlGrammar),
        Dialect::Postgres => Arc::new(PostgresGrammar),
    }
}

/// Split a dotted field path into segments.
pub(crate) fn path_segments(field: &str) -> impl Iterator<Item = &str> {
    field.split('.')
}

/// Parse a server version string such as `8.0.36-0ubuntu0.22.04.1` or `16.2 (Debian 16.2-1)`.
///
/// Missing components default to zero; returns `None` when no leading number exists.
pub fn parse_server_version(version: &str) -> Option<(u32, u32, u32)> {
    let numeric: String = version
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let mut parts = numeric.split('.').filter(|p| !p.is_empty()).map(str::parse::<u32>);

    let major = parts.next()?.ok()?;
    let minor = parts.next().and_then(Result::ok).unwrap_or(0);
    let patch = parts.next().and_then(Result::ok).unwrap_or(0);
    Some((major, minor, patch))
}
