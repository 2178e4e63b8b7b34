//! Output formatting for insert command results.

use super::execute::InsertResult;
use crate::output::Outputable;

impl Outputable for InsertResult {
    fn to_table(&self) -> String {
        let mut lines = vec![format!(
            "Inserted {} into {}",
            self.inserted, self.collection
        )];
        for id in &self.ids {
            lines.push(format!("  {}", id));
        }
        lines.join("\n")
    }
}
