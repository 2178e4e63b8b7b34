//! docsql library - document-store queries over relational JSON columns
//!
//! Stores schemaless JSON documents in MySQL (8.0.4+) or PostgreSQL (9.4+)
//! tables and queries them with MongoDB-style filter documents. Filters compile
//! to dialect-specific SQL over the JSON column; in-process predicate filters
//! are evaluated after fetching.
//!
//! Start with [`store::Driver`].

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod output;
pub mod queries;
pub mod store;

pub use db::{DbError, Document};
pub use queries::builder::compilers::Dialect;
pub use queries::{Filter, FindOptions, FindQuery, SortSpec};
pub use store::{Collection, Cursor, Driver};

#[macro_use]
pub mod test_macros;

#[cfg(test)]
pub mod test_utils;
