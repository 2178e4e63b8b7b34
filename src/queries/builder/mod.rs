//! Dialect-agnostic SQL statement building.
//!
//! # Architecture
//!
//! Statement building has three layers:
//!
//! 1. **Grammar** - `DialectGrammar` renders every dialect-specific fragment
//! 2. **Predicates** - `PredicateCompiler` turns criteria trees into boolean SQL
//! 3. **Statements** - `QueryBuilder` assembles full statements for one collection table
//!
//! # Example
//!
//! ```ignore
//! let builder = QueryBuilder::new(grammar_for(Dialect::Postgres));
//! let sql = builder.build_select("posts", &filter, &FindOptions::new().limit(10))?;
//! let rows = connection.query(&sql)?;
//! ```

pub mod compilers;
pub mod operator;
pub mod predicate;

use std::sync::Arc;

use compilers::DialectGrammar;
use predicate::PredicateCompiler;

use crate::db::{DbError, Document};
use crate::queries::filter::{Filter, FindOptions, SortSpec};

/// Builds complete statements against collection tables.
#[derive(Clone)]
pub struct QueryBuilder {
    grammar: Arc<dyn DialectGrammar>,
}

impl QueryBuilder {
    pub fn new(grammar: Arc<dyn DialectGrammar>) -> Self {
        Self { grammar }
    }

    pub fn grammar(&self) -> &dyn DialectGrammar {
        self.grammar.as_ref()
    }

    /// Compile a criteria tree to a bare boolean expression.
    pub fn compile_criteria(&self, criteria: &Document) -> Result<Option<String>, DbError> {
        PredicateCompiler::new(self.grammar.as_ref()).compile(criteria)
    }

    /// Build the `WHERE` clause for a filter.
    ///
    /// Predicate filters never produce SQL; they are evaluated per row.
    pub fn build_where(&self, filter: &Filter) -> Result<Option<String>, DbError> {
        match filter {
            Filter::Criteria(criteria) => Ok(self
                .compile_criteria(criteria)?
                .map(|condition| format!("WHERE {}", condition))),
            Filter::Predicate(_) => Ok(None),
        }
    }

    /// Build the `ORDER BY` clause; values sort by their JSON type.
    pub fn build_order_by(&self, sort: &SortSpec) -> Option<String> {
        if sort.is_empty() {
            return None;
        }

        let segments: Vec<String> = sort
            .iter()
            .map(|(field, descending)| {
                format!(
                    "{} {}",
                    self.grammar.json_selector(field),
                    if descending { "DESC" } else { "ASC" }
                )
            })
            .collect();

        Some(format!("ORDER BY {}", segments.join(", ")))
    }

    /// Build the `LIMIT`/`OFFSET` clause.
    ///
    /// A zero or absent limit means no limit. A skip without a limit uses the
    /// dialect's unbounded limit, since neither dialect accepts a bare OFFSET
    /// portably.
    pub fn build_limit(&self, limit: Option<u64>, skip: Option<u64>) -> Option<String> {
        let limit = limit.filter(|&n| n > 0);
        let skip = skip.filter(|&n| n > 0);

        match (limit, skip) {
            (None, None) => None,
            (Some(limit), None) => Some(format!("LIMIT {}", limit)),
            (Some(limit), Some(skip)) => Some(format!("LIMIT {} OFFSET {}", limit, skip)),
            (None, Some(skip)) => Some(format!(
                "LIMIT {} OFFSET {}",
                self.grammar.unbounded_limit(),
                skip
            )),
        }
    }

    /// Build the `SELECT` for `find`.
    ///
    /// Criteria filters push limit and skip into SQL. Predicate filters only
    /// carry the ordering; the cursor counts matches itself.
    pub fn build_select(
        &self,
        table: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<String, DbError> {
        let mut parts = vec![format!(
            "SELECT {} FROM {}",
            self.grammar.quote_identifier("document"),
            self.grammar.quote_identifier(table)
        )];

        parts.extend(self.build_where(filter)?);
        parts.extend(self.build_order_by(&options.sort));
        if !filter.is_predicate() {
            parts.extend(self.build_limit(options.limit, options.skip));
        }

        Ok(parts.join(" "))
    }

    pub fn build_count(&self, table: &str, filter: &Filter) -> Result<String, DbError> {
        let mut parts = vec![format!(
            "SELECT COUNT(*) FROM {}",
            self.grammar.quote_identifier(table)
        )];
        parts.extend(self.build_where(filter)?);
        Ok(parts.join(" "))
    }

    pub fn build_delete(&self, table: &str, filter: &Filter) -> Result<String, DbError> {
        let mut parts = vec![format!("DELETE FROM {}", self.grammar.quote_identifier(table))];
        parts.extend(self.build_where(filter)?);
        Ok(parts.join(" "))
    }

    /// Insert one document bound as the first parameter.
    pub fn build_insert(&self, table: &str) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.grammar.quote_identifier(table),
            self.grammar.quote_identifier("document"),
            self.grammar.document_placeholder(1)
        )
    }

    /// Overwrite the whole document with the given `_id`; the new document is bound as the first parameter.
    pub fn build_update_by_id(&self, table: &str, id: &str) -> String {
        format!(
            "UPDATE {} SET {} = {} WHERE {}",
            self.grammar.quote_identifier(table),
            self.grammar.quote_identifier("document"),
            self.grammar.document_placeholder(1),
            self.grammar.id_predicate(id)
        )
    }

    pub fn build_delete_by_id(&self, table: &str, id: &str) -> String {
        format!(
            "DELETE FROM {} WHERE {}",
            self.grammar.quote_identifier(table),
            self.grammar.id_predicate(id)
        )
    }

    pub fn build_exists_by_id(&self, table: &str, id: &str) -> String {
        format!(
            "SELECT 1 FROM {} WHERE {} LIMIT 1",
            self.grammar.quote_identifier(table),
            self.grammar.id_predicate(id)
        )
    }
}
