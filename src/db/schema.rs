//! Table-per-collection bootstrap.
//!
//! Each collection lives in one table with an integer identity column `id`
//! and a JSON document column `document`, plus a unique index on the
//! document's `_id`. Tables are created on first use; there are no
//! migrations beyond that.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{Connection, DbError};
use crate::queries::builder::compilers::DialectGrammar;

/// Creates, drops and renames collection tables.
#[derive(Clone)]
pub struct SchemaManager {
    grammar: Arc<dyn DialectGrammar>,
}

impl SchemaManager {
    pub fn new(grammar: Arc<dyn DialectGrammar>) -> Self {
        Self { grammar }
    }

    /// Check whether the table for `collection` exists.
    ///
    /// A table exists when the check returns at least one row whose first
    /// cell is not NULL (`to_regclass` yields a NULL row for missing tables).
    pub fn table_exists(&self, conn: &mut dyn Connection, collection: &str) -> Result<bool, DbError> {
        let rows = conn.query(&self.grammar.exists_check_sql(collection))?;
        Ok(rows
            .iter()
            .any(|row| row.first().is_some_and(|cell| cell.is_some())))
    }

    /// Create the table for `collection` unless it already exists.
    ///
    /// Returns `true` when the table was created.
    ///
    /// # Errors
    /// A failed `CREATE` is reported as `DbError::SchemaFailed` and is not
    /// retried within the call. A table whose index failed is dropped again.
    pub fn ensure_table(&self, conn: &mut dyn Connection, collection: &str) -> Result<bool, DbError> {
        if self.table_exists(conn, collection)? {
            debug!(collection, "Table exists");
            return Ok(false);
        }

        for (i, statement) in self.grammar.create_table_sql(collection).iter().enumerate() {
            if let Err(e) = conn.execute(statement, &[]) {
                // A table without its `_id` index would pass the existence
                // check forever; remove it so the next access starts over
                if i > 0 {
                    if let Err(cleanup) = conn.execute(&self.grammar.drop_table_sql(collection), &[]) {
                        warn!(collection, error = %cleanup, "Failed to remove partially created table");
                    }
                }
                return Err(DbError::SchemaFailed {
                    collection: collection.to_string(),
                    message: e.to_string(),
                });
            }
        }

        info!(collection, dialect = %self.grammar.dialect(), "Created collection table");
        Ok(true)
    }

    pub fn drop_table(&self, conn: &mut dyn Connection, collection: &str) -> Result<(), DbError> {
        conn.execute(&self.grammar.drop_table_sql(collection), &[])?;
        info!(collection, "Dropped collection table");
        Ok(())
    }

    pub fn rename_table(
        &self,
        conn: &mut dyn Connection,
        from: &str,
        to: &str,
    ) -> Result<(), DbError> {
        for statement in self.grammar.rename_table_sql(from, to) {
            conn.execute(&statement, &[])?;
        }
        info!(from, to, "Renamed collection table");
        Ok(())
    }
}
