//! Document-store API over a relational connection.
//!
//! `Driver` owns one connection (shared with every `Collection` through
//! `Store`) and a cache of collection handles. Collections compile filters
//! eagerly and hand back lazy `Cursor`s.
//!
//! # Concurrency
//!
//! All operations are synchronous. The connection sits behind a mutex held
//! for one statement at a time (or for one existence-check-then-create
//! sequence), so handles can be shared across threads. There are no
//! transactions: multi-statement operations such as `update_many` are not
//! atomic.

mod collection;
mod cursor;
mod driver;
mod id;
mod projection;

pub use collection::{Collection, CollectionObserver};
pub use cursor::{Cursor, CursorState};
pub use driver::Driver;
pub use id::{IdGenerator, ObjectIdGenerator};
pub use projection::Projection;

use std::sync::Mutex;

use tracing::debug;

use crate::db::{Connection, DbError, Row, SchemaManager};
use crate::queries::builder::QueryBuilder;

/// State shared by a driver and all of its collections.
pub(crate) struct Store {
    connection: Mutex<Box<dyn Connection>>,
    builder: QueryBuilder,
    schema: SchemaManager,
    ids: Box<dyn IdGenerator>,
}

impl Store {
    pub(crate) fn new(
        connection: Box<dyn Connection>,
        builder: QueryBuilder,
        schema: SchemaManager,
        ids: Box<dyn IdGenerator>,
    ) -> Self {
        Self {
            connection: Mutex::new(connection),
            builder,
            schema,
            ids,
        }
    }

    pub(crate) fn builder(&self) -> &QueryBuilder {
        &self.builder
    }

    pub(crate) fn next_id(&self) -> String {
        self.ids.generate()
    }

    pub(crate) fn query(&self, sql: &str) -> Result<Vec<Row>, DbError> {
        debug!(sql, "query");
        let mut conn = self.connection.lock()?;
        conn.query(sql)
    }

    pub(crate) fn query_scalar(&self, sql: &str) -> Result<Option<String>, DbError> {
        debug!(sql, "query_scalar");
        let mut conn = self.connection.lock()?;
        conn.query_scalar(sql)
    }

    pub(crate) fn execute(&self, sql: &str, params: &[&str]) -> Result<u64, DbError> {
        debug!(sql, params = params.len(), "execute");
        let mut conn = self.connection.lock()?;
        conn.execute(sql, params)
    }

    /// Existence check and creation run under one lock.
    pub(crate) fn ensure_table(&self, table: &str) -> Result<bool, DbError> {
        let mut conn = self.connection.lock()?;
        self.schema.ensure_table(conn.as_mut(), table)
    }

    pub(crate) fn drop_table(&self, table: &str) -> Result<(), DbError> {
        let mut conn = self.connection.lock()?;
        self.schema.drop_table(conn.as_mut(), table)
    }

    pub(crate) fn rename_table(&self, from: &str, to: &str) -> Result<(), DbError> {
        let mut conn = self.connection.lock()?;
        self.schema.rename_table(conn.as_mut(), from, to)
    }
}
