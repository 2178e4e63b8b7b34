//! Filters, sort specifications and find options.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::db::{DbError, Document};

/// A caller-supplied document test evaluated outside SQL.
pub type PredicateFn = Arc<dyn Fn(&Document) -> bool + Send + Sync>;

/// Selects which documents an operation applies to.
///
/// `Criteria` trees compile to a SQL `WHERE` clause. `Predicate` functions
/// never reach the query builder: rows are decoded and tested one by one.
#[derive(Clone)]
pub enum Filter {
    Criteria(Document),
    Predicate(PredicateFn),
}

impl Filter {
    /// A filter matching every document.
    pub fn all() -> Self {
        Filter::Criteria(Document::new())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Document) -> bool + Send + Sync + 'static,
    {
        Filter::Predicate(Arc::new(f))
    }

    /// Build a criteria filter from a JSON value; `null` matches everything.
    pub fn from_value(value: Value) -> Result<Self, DbError> {
        match value {
            Value::Null => Ok(Filter::all()),
            Value::Object(criteria) => Ok(Filter::Criteria(criteria)),
            other => Err(DbError::MalformedOperand {
                operator: "filter".to_string(),
                message: format!("expected object, got {}", other),
            }),
        }
    }

    /// Criteria selecting a single document by `_id`.
    pub fn by_id(id: &str) -> Self {
        let mut criteria = Document::new();
        criteria.insert("_id".to_string(), Value::String(id.to_string()));
        Filter::Criteria(criteria)
    }

    pub fn is_predicate(&self) -> bool {
        matches!(self, Filter::Predicate(_))
    }

    /// Test a decoded document. Criteria filters were applied in SQL and always pass.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::Criteria(_) => true,
            Filter::Predicate(f) => f(document),
        }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Filter::all()
    }
}

impl From<Document> for Filter {
    fn from(criteria: Document) -> Self {
        Filter::Criteria(criteria)
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Criteria(criteria) => f.debug_tuple("Criteria").field(criteria).finish(),
            Filter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Ordered sort specification: field path to direction.
///
/// A direction of `-1` sorts descending; any other value sorts ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    entries: Vec<(String, i64)>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asc(self, field: impl Into<String>) -> Self {
        self.by(field, 1)
    }

    pub fn desc(self, field: impl Into<String>) -> Self {
        self.by(field, -1)
    }

    pub fn by(mut self, field: impl Into<String>, direction: i64) -> Self {
        self.entries.push((field.into(), direction));
        self
    }

    /// Parse a `{"field": 1, "other": -1}` mapping, keeping key order.
    pub fn from_document(spec: &Document) -> Result<Self, DbError> {
        let mut sort = SortSpec::new();
        for (field, direction) in spec {
            let direction = direction.as_i64().ok_or_else(|| DbError::MalformedOperand {
                operator: "sort".to_string(),
                message: format!("direction for '{}' must be 1 or -1, got {}", field, direction),
            })?;
            sort = sort.by(field.clone(), direction);
        }
        Ok(sort)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(field, descending)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries
            .iter()
            .map(|(field, direction)| (field.as_str(), *direction == -1))
    }
}

/// Shaping options for `Collection::find`.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub projection: Option<Document>,
    pub sort: SortSpec,
    /// `None` and `Some(0)` both mean unlimited.
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// The effective limit, with zero folded into "unlimited".
    pub fn effective_limit(&self) -> Option<u64> {
        self.limit.filter(|&n| n > 0)
    }

    pub fn effective_skip(&self) -> u64 {
        self.skip.unwrap_or(0)
    }
}

/// Everything `Driver::find` accepts: a filter plus shaping options.
#[derive(Debug, Clone, Default)]
pub struct FindQuery {
    pub filter: Filter,
    pub fields: Option<Document>,
    pub sort: SortSpec,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

impl FindQuery {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn into_parts(self) -> (Filter, FindOptions) {
        let options = FindOptions {
            projection: self.fields,
            sort: self.sort,
            limit: self.limit,
            skip: self.skip,
        };
        (self.filter, options)
    }
}
