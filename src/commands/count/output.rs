//! Output formatting for count command results.

use super::execute::CountResult;
use crate::output::Outputable;

impl Outputable for CountResult {
    fn to_table(&self) -> String {
        let noun = if self.count == 1 { "document" } else { "documents" };
        format!("{}: {} {}", self.collection, self.count, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn result() -> CountResult {
        CountResult {
            collection: "blog/posts".to_string(),
            count: 3,
        }
    }

    crate::output_table_test! {
        test_name: test_to_table,
        fixture: result,
        fixture_type: CountResult,
        expected: "blog/posts: 3 documents",
    }

    crate::output_json_test! {
        test_name: test_format_json,
        fixture: result,
        fixture_type: CountResult,
        assertions: {
            "collection": "blog/posts",
            "count": 3,
        },
    }

    #[rstest]
    fn test_singular() {
        let one = CountResult {
            collection: "posts".to_string(),
            count: 1,
        };
        assert_eq!(one.to_table(), "posts: 1 document");
    }
}
