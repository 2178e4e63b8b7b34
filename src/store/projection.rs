//! Field projection applied to decoded documents.
//!
//! A projection spec maps top-level field names to truthy (include) or falsy
//! (exclude) values. Exclusions are removed first, then, if any inclusions
//! exist, only included fields are kept. `_id` survives unless it is
//! explicitly excluded.

use crate::db::{is_truthy, Document};

/// A compiled projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    include: Vec<String>,
    exclude: Vec<String>,
}

impl Projection {
    /// Compile a projection spec; `None` when the spec is empty.
    pub fn compile(spec: &Document) -> Option<Self> {
        if spec.is_empty() {
            return None;
        }

        let (include, exclude): (Vec<_>, Vec<_>) = spec
            .iter()
            .partition(|(_, value)| is_truthy(value));

        Some(Self {
            include: include.into_iter().map(|(k, _)| k.clone()).collect(),
            exclude: exclude.into_iter().map(|(k, _)| k.clone()).collect(),
        })
    }

    pub fn apply(&self, mut document: Document) -> Document {
        let keep_id = !self.exclude.iter().any(|f| f == "_id");

        for field in &self.exclude {
            document.shift_remove(field);
        }

        if !self.include.is_empty() {
            document.retain(|key, _| {
                (keep_id && key == "_id") || self.include.iter().any(|f| f == key)
            });
        }

        document
    }
}
