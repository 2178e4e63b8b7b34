//! Output formatting for remove command results.

use super::execute::RemoveResult;
use crate::output::Outputable;

impl Outputable for RemoveResult {
    fn to_table(&self) -> String {
        format!("Removed {} from {}", self.removed, self.collection)
    }
}
