//! Output formatting for compile command results.

use super::execute::CompileResult;
use crate::output::Outputable;

impl Outputable for CompileResult {
    fn to_table(&self) -> String {
        self.sql.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::StatementKind;
    use crate::queries::builder::compilers::Dialect;
    use rstest::{fixture, rstest};

    #[fixture]
    fn result() -> CompileResult {
        CompileResult {
            dialect: Dialect::Postgres,
            statement: StatementKind::Count,
            sql: "SELECT COUNT(*) FROM \"posts\"".to_string(),
        }
    }

    crate::output_table_test! {
        test_name: test_to_table_is_bare_sql,
        fixture: result,
        fixture_type: CompileResult,
        expected: "SELECT COUNT(*) FROM \"posts\"",
    }

    crate::output_json_test! {
        test_name: test_format_json,
        fixture: result,
        fixture_type: CompileResult,
        assertions: {
            "dialect": "postgres",
            "statement": "count",
            "sql": "SELECT COUNT(*) FROM \"posts\"",
        },
    }
}
