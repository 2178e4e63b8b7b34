//! Lazy result iteration.

use std::sync::Arc;
use std::vec::IntoIter;

use super::projection::Projection;
use super::Store;
use crate::db::{decode_document, DbError, Document, Row};
use crate::queries::filter::{Filter, FindOptions};

/// Observable cursor lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// The statement has not been sent yet.
    Unconsumed,
    Iterating,
    Exhausted,
}

enum Rows {
    Pending,
    Fetched(IntoIter<Row>),
    Done,
}

/// Iterator over the documents matched by `Collection::find`.
///
/// The statement is compiled when the cursor is created and sent on the first
/// call to `next`. Each row is decoded, tested against a predicate filter,
/// counted against skip/limit (predicate filters only, criteria filters push
/// them into SQL) and finally projected. That order is fixed.
pub struct Cursor {
    store: Arc<Store>,
    sql: String,
    filter: Filter,
    projection: Option<Projection>,
    skip: u64,
    limit: Option<u64>,
    matched: u64,
    yielded: u64,
    rows: Rows,
}

impl Cursor {
    pub(crate) fn new(store: Arc<Store>, sql: String, filter: Filter, options: &FindOptions) -> Self {
        Self {
            store,
            sql,
            projection: options.projection.as_ref().and_then(Projection::compile),
            skip: options.effective_skip(),
            limit: options.effective_limit(),
            filter,
            matched: 0,
            yielded: 0,
            rows: Rows::Pending,
        }
    }

    /// The SQL this cursor sends.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn state(&self) -> CursorState {
        match self.rows {
            Rows::Pending => CursorState::Unconsumed,
            Rows::Fetched(_) => CursorState::Iterating,
            Rows::Done => CursorState::Exhausted,
        }
    }

    /// Drain the cursor into a vector.
    pub fn to_array(self) -> Result<Vec<Document>, DbError> {
        self.collect()
    }

    fn limit_reached(&self) -> bool {
        self.filter.is_predicate() && self.limit.is_some_and(|limit| self.yielded >= limit)
    }
}

impl Iterator for Cursor {
    type Item = Result<Document, DbError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.limit_reached() {
                self.rows = Rows::Done;
            }

            let row = match &mut self.rows {
                Rows::Done => return None,
                Rows::Pending => {
                    match self.store.query(&self.sql) {
                        Ok(rows) => self.rows = Rows::Fetched(rows.into_iter()),
                        Err(e) => {
                            self.rows = Rows::Done;
                            return Some(Err(e));
                        }
                    }
                    continue;
                }
                Rows::Fetched(rows) => rows.next(),
            };

            let Some(row) = row else {
                self.rows = Rows::Done;
                return None;
            };

            let Some(text) = row.into_iter().next().flatten() else {
                continue;
            };
            let document = match decode_document(&text) {
                Ok(document) => document,
                Err(e) => return Some(Err(e)),
            };

            if self.filter.is_predicate() {
                if !self.filter.matches(&document) {
                    continue;
                }
                self.matched += 1;
                if self.matched <= self.skip {
                    continue;
                }
            }

            self.yielded += 1;
            return Some(Ok(match &self.projection {
                Some(projection) => projection.apply(document),
                None => document,
            }));
        }
    }
}
