//! Connection capability consumed by the document store.
//!
//! The store needs exactly two primitives from a database connection: run a
//! statement (optionally with bound text parameters) and fetch rows as text.
//! PostgreSQL is supported out of the box through `postgres::Client`; any other
//! client (e.g. a MySQL driver) plugs in by implementing `Connection`.

use postgres::types::ToSql;
use postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::info;

use super::config::DatabaseConfig;
use super::DbError;
use crate::queries::builder::compilers::Dialect;

/// One result row; every cell is text or SQL NULL.
pub type Row = Vec<Option<String>>;

/// Trait for database connections that can execute SQL.
///
/// Implementations are used from one thread at a time; the driver serialises
/// access behind a mutex.
pub trait Connection: Send {
    /// Get the backend name for logging/debugging.
    fn backend_name(&self) -> &'static str;

    /// Execute a statement, returning the number of affected rows.
    ///
    /// `params` are bound to the dialect's placeholders in order.
    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<u64, DbError>;

    /// Run a query and fetch all rows.
    fn query(&mut self, sql: &str) -> Result<Vec<Row>, DbError>;

    /// Run a query and return the first cell of the first row.
    fn query_scalar(&mut self, sql: &str) -> Result<Option<String>, DbError> {
        let rows = self.query(sql)?;
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .flatten())
    }
}

impl Connection for Client {
    fn backend_name(&self) -> &'static str {
        "Postgres"
    }

    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<u64, DbError> {
        if params.is_empty() {
            let messages = self.simple_query(sql)?;
            let affected = messages
                .iter()
                .map(|message| match message {
                    SimpleQueryMessage::CommandComplete(n) => *n,
                    _ => 0,
                })
                .sum();
            return Ok(affected);
        }

        let values: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        Ok(Client::execute(self, sql, &values)?)
    }

    fn query(&mut self, sql: &str) -> Result<Vec<Row>, DbError> {
        // Simple-query protocol returns every column as text, jsonb included
        let messages = self.simple_query(sql)?;
        let mut rows = Vec::new();
        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                rows.push((0..row.len()).map(|i| row.get(i).map(str::to_string)).collect());
            }
        }
        Ok(rows)
    }
}

/// Open a connection for the given configuration.
///
/// # Errors
/// Returns `DbError::ConnectFailed` when the server cannot be reached or
/// rejects the credentials, and `DbError::Config` for MySQL, whose client is
/// supplied by the caller through `Driver::new`.
pub fn open_connection(config: &DatabaseConfig) -> Result<Box<dyn Connection>, DbError> {
    match config.dialect {
        Dialect::Postgres => {
            let options = &config.options;
            let mut pg = postgres::Config::new();
            pg.host(&options.host)
                .port(options.port_or_default(Dialect::Postgres))
                .dbname(&options.dbname)
                .user(&options.username);
            if let Some(password) = &options.password {
                pg.password(password);
            }

            let client = pg.connect(NoTls).map_err(|e| DbError::ConnectFailed {
                backend: "Postgres".to_string(),
                message: e.to_string(),
            })?;

            info!(host = %options.host, dbname = %options.dbname, "Connected to PostgreSQL");
            Ok(Box::new(client))
        }
        Dialect::Mysql => Err(DbError::Config {
            message: "no built-in MySQL client; pass a Connection implementation to Driver::new"
                .to_string(),
        }),
    }
}
