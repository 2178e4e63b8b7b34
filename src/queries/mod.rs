//! Filter model and SQL compilation.
//!
//! `filter` holds the caller-facing types (`Filter`, `SortSpec`,
//! `FindOptions`, `FindQuery`). `builder` turns them into dialect-specific SQL.

pub mod builder;
pub mod filter;

pub use filter::{Filter, FindOptions, FindQuery, PredicateFn, SortSpec};
