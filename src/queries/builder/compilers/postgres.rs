//! PostgreSQL grammar.
//!
//! Implements `DialectGrammar` for PostgreSQL 9.4+ `jsonb`, which uses:
//! - Double-quoted identifiers
//! - `#>` / `#>>` extraction with text-array paths (`'{a,b}'`)
//! - Every scalar literal quoted as text, compared against `#>>` text
//! - `?`, `?&` and `@>` for array membership, `~*` for regular expressions
//!
//! Statements are sent over the simple-query protocol, so the `?` operators
//! never collide with parameter placeholders.
//!
//! Comparisons are lexical: `{"_o": {"$gt": 9}}` compares `'10' > '9'` as
//! text and does not match.
//!
//! `jsonb` stores objects in its own canonical key order (shorter keys
//! first), so documents read back from PostgreSQL do not keep the key order
//! they were inserted with. Only projections, which put `_id` first, have a
//! stable order.

use serde_json::Value;

use super::{path_segments, Dialect, DialectGrammar};
use crate::db::{encode, escape_like, escape_postgres_string, type_name, DbError};

const DOCUMENT_COLUMN: &str = "\"document\"";

/// PostgreSQL grammar implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresGrammar;

/// Render one element of a text-array literal, quoting it when needed.
fn array_element(segment: &str) -> String {
    let needs_quotes = segment.is_empty()
        || segment.eq_ignore_ascii_case("null")
        || segment
            .chars()
            .any(|c| matches!(c, ',' | '{' | '}' | '"' | '\\') || c.is_whitespace());

    if needs_quotes {
        format!("\"{}\"", segment.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        segment.to_string()
    }
}

impl DialectGrammar for PostgresGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn quote_string(&self, s: &str) -> String {
        escape_postgres_string(s)
    }

    fn quote_literal(&self, value: &Value) -> Result<String, DbError> {
        match value {
            Value::Null => Ok("NULL".to_string()),
            Value::Bool(b) => Ok(self.quote_string(&b.to_string())),
            Value::Number(n) => Ok(self.quote_string(&n.to_string())),
            Value::String(s) => Ok(self.quote_string(s)),
            other => Err(DbError::InvalidValue {
                type_name: type_name(other),
            }),
        }
    }

    fn json_literal(&self, value: &Value) -> Result<String, DbError> {
        Ok(format!("{}::jsonb", self.quote_string(&encode(value)?)))
    }

    fn path_expression(&self, field: &str) -> String {
        let elements: Vec<String> = path_segments(field).map(array_element).collect();
        self.quote_string(&format!("{{{}}}", elements.join(",")))
    }

    fn text_selector(&self, field: &str) -> String {
        format!("{} #>> {}", DOCUMENT_COLUMN, self.path_expression(field))
    }

    fn json_selector(&self, field: &str) -> String {
        format!("{} #> {}", DOCUMENT_COLUMN, self.path_expression(field))
    }

    fn null_check_sql(&self, field: &str, is_null: bool) -> String {
        // `#>>` yields SQL NULL for both a missing path and a JSON null
        let check = if is_null { "IS NULL" } else { "IS NOT NULL" };
        format!("{} {}", self.text_selector(field), check)
    }

    fn contains_sql(&self, field: &str, value: &Value) -> Result<String, DbError> {
        match value {
            Value::String(s) => Ok(format!(
                "({}) ? {}",
                self.json_selector(field),
                self.quote_string(s)
            )),
            other => Ok(format!(
                "({}) @> {}",
                self.json_selector(field),
                self.json_literal(&Value::Array(vec![other.clone()]))?
            )),
        }
    }

    fn contains_all_sql(&self, field: &str, values: &[Value]) -> Result<String, DbError> {
        let strings: Option<Vec<&str>> = values.iter().map(Value::as_str).collect();
        match strings {
            Some(strings) => {
                let quoted: Vec<String> = strings.iter().map(|s| self.quote_string(s)).collect();
                Ok(format!(
                    "({}) ?& array[{}]",
                    self.json_selector(field),
                    quoted.join(", ")
                ))
            }
            None => Ok(format!(
                "({}) @> {}",
                self.json_selector(field),
                self.json_literal(&Value::Array(values.to_vec()))?
            )),
        }
    }

    fn regex_sql(&self, field: &str, pattern: &str) -> String {
        format!("{} ~* {}", self.text_selector(field), self.quote_string(pattern))
    }

    fn array_length_sql(&self, field: &str, length: i64) -> String {
        // jsonb_array_length raises on scalars, so non-arrays become NULL first
        let selector = self.json_selector(field);
        format!(
            "jsonb_array_length(CASE WHEN jsonb_typeof({}) = 'array' THEN {} END) = {}",
            selector, selector, length
        )
    }

    fn modulo_sql(&self, field: &str, divisor: i64, remainder: i64) -> String {
        format!(
            "({})::int % {} = {}",
            self.text_selector(field),
            divisor,
            remainder
        )
    }

    fn like_sql(&self, field: &str, needle: &str) -> String {
        format!(
            "({})::text LIKE {}",
            self.text_selector(field),
            self.quote_string(&format!("%{}%", escape_like(needle)))
        )
    }

    fn exists_check_sql(&self, table: &str) -> String {
        format!(
            "SELECT to_regclass({})",
            self.quote_string(&self.quote_identifier(table))
        )
    }

    fn create_table_sql(&self, table: &str) -> Vec<String> {
        let quoted = self.quote_identifier(table);
        vec![
            format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                 \"id\" serial NOT NULL, \
                 \"document\" jsonb NOT NULL, \
                 PRIMARY KEY (\"id\")\
                 )",
                quoted
            ),
            // Unnamed so PostgreSQL picks a free name; explicit names are
            // truncated to 63 bytes and collide for long collection ids
            format!(
                "CREATE UNIQUE INDEX ON {} ((\"document\" ->> '_id'))",
                quoted
            ),
        ]
    }

    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote_identifier(table))
    }

    fn rename_table_sql(&self, from: &str, to: &str) -> Vec<String> {
        // The `_id` index follows the table
        vec![format!(
            "ALTER TABLE {} RENAME TO {}",
            self.quote_identifier(from),
            self.quote_identifier(to)
        )]
    }

    fn id_predicate(&self, id: &str) -> String {
        format!("({} ->> '_id') = {}", DOCUMENT_COLUMN, self.quote_string(id))
    }

    fn document_placeholder(&self, index: usize) -> String {
        // Declared as text so the parameter binds from a Rust string
        format!("${}::text::jsonb", index)
    }

    fn unbounded_limit(&self) -> &'static str {
        "ALL"
    }

    fn server_version_sql(&self) -> &'static str {
        "SHOW server_version"
    }

    fn min_server_version(&self) -> (u32, u32, u32) {
        (9, 4, 0)
    }

    fn session_init_sql(&self) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("content", "'{content}'")]
    #[case("author.name", "'{author,name}'")]
    #[case("tags.0", "'{tags,0}'")]
    #[case("my key", "'{\"my key\"}'")]
    #[case("a,b", "'{\"a,b\"}'")]
    #[case("it's", "'{it''s}'")]
    #[case("null", "'{\"null\"}'")]
    fn test_path_expression(#[case] field: &str, #[case] expected: &str) {
        assert_eq!(PostgresGrammar.path_expression(field), expected);
    }

    #[rstest]
    #[case(json!(null), "NULL")]
    #[case(json!(true), "'true'")]
    #[case(json!(5), "'5'")]
    #[case(json!(2.5), "'2.5'")]
    #[case(json!("Lorem"), "'Lorem'")]
    #[case(json!("it's"), "'it''s'")]
    fn test_quote_literal_quotes_everything(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(PostgresGrammar.quote_literal(&value).unwrap(), expected);
    }

    #[test]
    fn test_quote_literal_rejects_array() {
        assert!(matches!(
            PostgresGrammar.quote_literal(&json!(["a"])),
            Err(DbError::InvalidValue { type_name: "array" })
        ));
    }

    #[test]
    fn test_quote_identifier_doubles_quotes() {
        assert_eq!(PostgresGrammar.quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_selectors() {
        assert_eq!(PostgresGrammar.text_selector("a.b"), "\"document\" #>> '{a,b}'");
        assert_eq!(PostgresGrammar.json_selector("a"), "\"document\" #> '{a}'");
    }

    #[test]
    fn test_null_check_uses_text_selector() {
        assert_eq!(PostgresGrammar.null_check_sql("a", true), "\"document\" #>> '{a}' IS NULL");
        assert_eq!(PostgresGrammar.null_check_sql("a", false), "\"document\" #>> '{a}' IS NOT NULL");
    }

    #[test]
    fn test_contains_string_uses_key_exists() {
        assert_eq!(
            PostgresGrammar.contains_sql("array", &json!("bar")).unwrap(),
            "(\"document\" #> '{array}') ? 'bar'"
        );
    }

    #[test]
    fn test_contains_number_uses_containment() {
        assert_eq!(
            PostgresGrammar.contains_sql("numbers", &json!(3)).unwrap(),
            "(\"document\" #> '{numbers}') @> '[3]'::jsonb"
        );
    }

    #[test]
    fn test_contains_all_strings() {
        assert_eq!(
            PostgresGrammar
                .contains_all_sql("array", &[json!("foo"), json!("bar")])
                .unwrap(),
            "(\"document\" #> '{array}') ?& array['foo', 'bar']"
        );
    }

    #[test]
    fn test_contains_all_mixed() {
        assert_eq!(
            PostgresGrammar
                .contains_all_sql("array", &[json!("foo"), json!(1)])
                .unwrap(),
            "(\"document\" #> '{array}') @> '[\"foo\",1]'::jsonb"
        );
    }

    #[test]
    fn test_regex_sql() {
        assert_eq!(
            PostgresGrammar.regex_sql("content", "^lorem"),
            "\"document\" #>> '{content}' ~* '^lorem'"
        );
    }

    #[test]
    fn test_like_sql() {
        assert_eq!(
            PostgresGrammar.like_sql("content", "a_b"),
            r#"("document" #>> '{content}')::text LIKE '%a\_b%'"#
        );
    }

    #[test]
    fn test_modulo_sql() {
        assert_eq!(
            PostgresGrammar.modulo_sql("_o", 2, 0),
            "(\"document\" #>> '{_o}')::int % 2 = 0"
        );
    }

    #[test]
    fn test_exists_check_sql() {
        assert_eq!(
            PostgresGrammar.exists_check_sql("cms/posts"),
            "SELECT to_regclass('\"cms/posts\"')"
        );
    }

    #[test]
    fn test_create_table_layout() {
        let statements = PostgresGrammar.create_table_sql("posts");
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0],
            "CREATE TABLE IF NOT EXISTS \"posts\" (\"id\" serial NOT NULL, \"document\" jsonb NOT NULL, PRIMARY KEY (\"id\"))"
        );
        assert_eq!(
            statements[1],
            "CREATE UNIQUE INDEX ON \"posts\" ((\"document\" ->> '_id'))"
        );
    }

    #[test]
    fn test_long_ids_leave_index_naming_to_server() {
        let long = format!("{}a", "c".repeat(61));
        let statements = PostgresGrammar.create_table_sql(&long);
        assert_eq!(
            statements[1],
            format!("CREATE UNIQUE INDEX ON \"{}\" ((\"document\" ->> '_id'))", long)
        );
    }

    #[test]
    fn test_rename_is_single_statement() {
        let statements = PostgresGrammar.rename_table_sql("old", "new");
        assert_eq!(statements, vec!["ALTER TABLE \"old\" RENAME TO \"new\"".to_string()]);
    }

    #[test]
    fn test_id_predicate_and_placeholder() {
        assert_eq!(
            PostgresGrammar.id_predicate("abc"),
            "(\"document\" ->> '_id') = 'abc'"
        );
        assert_eq!(PostgresGrammar.document_placeholder(1), "$1::text::jsonb");
        assert_eq!(PostgresGrammar.unbounded_limit(), "ALL");
    }
}
