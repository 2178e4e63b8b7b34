//! MySQL grammar.
//!
//! Implements `DialectGrammar` for MySQL 8, which uses:
//! - Backtick-quoted identifiers
//! - `->` / `->>` JSON extraction with `$.a.b` paths
//! - Unquoted numeric, boolean and null literals (numeric coercion against `->>` text)
//! - `JSON_TYPE` to tell a stored JSON null apart from a present value
//!
//! Numbers compare against `->>` text with MySQL's numeric coercion, so
//! non-numeric text converts to 0: `{"content": 0}` matches every document
//! whose `content` is a string that does not start with a digit. PostgreSQL
//! compares the same filter lexically instead (see `PostgresGrammar`).
//! - `JSON_CONTAINS` for array membership and `REGEXP_LIKE` for regular expressions

use serde_json::Value;

use super::{path_segments, Dialect, DialectGrammar};
use crate::db::{encode, escape_like, escape_mysql_string, type_name, DbError};

const DOCUMENT_COLUMN: &str = "`document`";

/// MySQL grammar implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlGrammar;

fn is_plain_key(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

impl DialectGrammar for MysqlGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn quote_string(&self, s: &str) -> String {
        escape_mysql_string(s)
    }

    fn quote_literal(&self, value: &Value) -> Result<String, DbError> {
        match value {
            Value::Null => Ok("NULL".to_string()),
            Value::Bool(true) => Ok("TRUE".to_string()),
            Value::Bool(false) => Ok("FALSE".to_string()),
            Value::Number(n) => Ok(n.to_string()),
            Value::String(s) => Ok(self.quote_string(s)),
            other => Err(DbError::InvalidValue {
                type_name: type_name(other),
            }),
        }
    }

    fn json_literal(&self, value: &Value) -> Result<String, DbError> {
        Ok(format!("CAST({} AS JSON)", self.quote_string(&encode(value)?)))
    }

    fn path_expression(&self, field: &str) -> String {
        let mut path = String::from("$");
        for segment in path_segments(field) {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                // Numeric segments address array positions
                path.push('[');
                path.push_str(segment);
                path.push(']');
            } else if is_plain_key(segment) {
                path.push('.');
                path.push_str(segment);
            } else {
                path.push_str(".\"");
                path.push_str(&segment.replace('\\', "\\\\").replace('"', "\\\""));
                path.push('"');
            }
        }
        self.quote_string(&path)
    }

    fn text_selector(&self, field: &str) -> String {
        format!("{} ->> {}", DOCUMENT_COLUMN, self.path_expression(field))
    }

    fn json_selector(&self, field: &str) -> String {
        format!("{} -> {}", DOCUMENT_COLUMN, self.path_expression(field))
    }

    fn null_check_sql(&self, field: &str, is_null: bool) -> String {
        // `->>` renders a stored JSON null as the text 'null', not SQL NULL
        let selector = self.json_selector(field);
        if is_null {
            format!("({} IS NULL OR JSON_TYPE({}) = 'NULL')", selector, selector)
        } else {
            format!("({} IS NOT NULL AND JSON_TYPE({}) <> 'NULL')", selector, selector)
        }
    }

    fn contains_sql(&self, field: &str, value: &Value) -> Result<String, DbError> {
        Ok(format!(
            "JSON_CONTAINS({}, {})",
            self.json_selector(field),
            self.json_literal(value)?
        ))
    }

    fn contains_all_sql(&self, field: &str, values: &[Value]) -> Result<String, DbError> {
        Ok(format!(
            "JSON_CONTAINS({}, {})",
            self.json_selector(field),
            self.json_literal(&Value::Array(values.to_vec()))?
        ))
    }

    fn regex_sql(&self, field: &str, pattern: &str) -> String {
        format!(
            "REGEXP_LIKE({}, {}, 'i')",
            self.text_selector(field),
            self.quote_string(pattern)
        )
    }

    fn array_length_sql(&self, field: &str, length: i64) -> String {
        let selector = self.json_selector(field);
        format!(
            "(JSON_TYPE({}) = 'ARRAY' AND JSON_LENGTH({}) = {})",
            selector, selector, length
        )
    }

    fn modulo_sql(&self, field: &str, divisor: i64, remainder: i64) -> String {
        format!(
            "CAST({} AS SIGNED) % {} = {}",
            self.text_selector(field),
            divisor,
            remainder
        )
    }

    fn like_sql(&self, field: &str, needle: &str) -> String {
        format!(
            "{} LIKE {}",
            self.text_selector(field),
            self.quote_string(&format!("%{}%", escape_like(needle)))
        )
    }

    fn exists_check_sql(&self, table: &str) -> String {
        format!("SHOW TABLES LIKE {}", self.quote_string(&escape_like(table)))
    }

    fn create_table_sql(&self, table: &str) -> Vec<String> {
        vec![format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
             `id` INT NOT NULL AUTO_INCREMENT, \
             `document` JSON NOT NULL, \
             `_id_virtual` VARCHAR(64) AS (`document` ->> '$._id') NOT NULL UNIQUE COMMENT 'Id', \
             `_created_virtual` TIMESTAMP AS (FROM_UNIXTIME(`document` ->> '$._created')) NULL COMMENT 'Created at', \
             `_modified_virtual` TIMESTAMP AS (FROM_UNIXTIME(`document` ->> '$._modified')) NULL COMMENT 'Modified at', \
             PRIMARY KEY (`id`)\
             ) DEFAULT CHARSET=utf8mb4",
            table = self.quote_identifier(table)
        )]
    }

    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote_identifier(table))
    }

    fn rename_table_sql(&self, from: &str, to: &str) -> Vec<String> {
        vec![format!(
            "RENAME TABLE {} TO {}",
            self.quote_identifier(from),
            self.quote_identifier(to)
        )]
    }

    fn id_predicate(&self, id: &str) -> String {
        format!("`_id_virtual` = {}", self.quote_string(id))
    }

    fn document_placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn unbounded_limit(&self) -> &'static str {
        "18446744073709551615"
    }

    fn server_version_sql(&self) -> &'static str {
        "SELECT VERSION()"
    }

    fn min_server_version(&self) -> (u32, u32, u32) {
        // REGEXP_LIKE arrived in 8.0.4
        (8, 0, 4)
    }

    fn session_init_sql(&self) -> Vec<String> {
        vec!["SET NAMES utf8mb4".to_string()]
    }
}
