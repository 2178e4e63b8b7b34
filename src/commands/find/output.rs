//! Output formatting for find command results.

use super::execute::FindResult;
use crate::output::{document_lines, Outputable};

impl Outputable for FindResult {
    fn to_table(&self) -> String {
        let noun = if self.count == 1 { "document" } else { "documents" };
        document_lines(
            format!("Collection: {} ({} {})", self.collection, self.count, noun),
            &self.documents,
            "No documents found.",
        )
    }
}
