//! Shared test utilities for driver and collection tests.
//!
//! `StubConnection` stands in for a real database: it records every statement,
//! answers version queries, tracks which tables exist and keeps inserted
//! documents in memory so unfiltered reads return them.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{json, Value};

use crate::db::{decode_document, Connection, DbError, Document, Row};
use crate::queries::builder::compilers::{grammar_for, Dialect, DialectGrammar};
use crate::store::Driver;

/// One statement seen by the stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub sql: String,
    pub params: Vec<String>,
}

#[derive(Default)]
struct StubState {
    log: Vec<Recorded>,
    responses: HashMap<String, Vec<Row>>,
    failures: Vec<(String, String)>,
    tables: BTreeMap<String, Vec<String>>,
}

/// In-memory recording connection.
///
/// Clones share state, so a test can hand one clone to the driver and keep
/// another for inspection.
#[derive(Clone)]
pub struct StubConnection {
    grammar: Arc<dyn DialectGrammar>,
    version: String,
    state: Arc<Mutex<StubState>>,
}

impl StubConnection {
    pub fn new(dialect: Dialect) -> Self {
        let version = match dialect {
            Dialect::Mysql => "8.0.36",
            Dialect::Postgres => "16.2",
        };
        Self {
            grammar: grammar_for(dialect),
            version: version.to_string(),
            state: Arc::new(Mutex::new(StubState::default())),
        }
    }

    pub fn mysql() -> Self {
        Self::new(Dialect::Mysql)
    }

    pub fn postgres() -> Self {
        Self::new(Dialect::Postgres)
    }

    /// Report a different server version.
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    fn state(&self) -> MutexGuard<'_, StubState> {
        self.state.lock().expect("stub state poisoned")
    }

    /// Answer `sql` with fixed rows instead of the simulated behaviour.
    pub fn respond_with(&mut self, sql: &str, rows: Vec<Row>) {
        self.state().responses.insert(sql.to_string(), rows);
    }

    /// Fail every statement starting with `prefix`.
    pub fn fail_on(&self, prefix: &str, message: &str) {
        self.state()
            .failures
            .push((prefix.to_string(), message.to_string()));
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Pretend `table` already exists, holding `documents`.
    pub fn with_table(self, table: &str, documents: &[Document]) -> Self {
        let encoded = documents
            .iter()
            .map(|d| serde_json::to_string(d).expect("encode fixture"))
            .collect();
        self.state().tables.insert(table.to_string(), encoded);
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.state().log.iter().map(|r| r.sql.clone()).collect()
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.state().log.clone()
    }

    /// Number of statements starting with `prefix`.
    pub fn count_starting_with(&self, prefix: &str) -> usize {
        self.state()
            .log
            .iter()
            .filter(|r| r.sql.starts_with(prefix))
            .count()
    }

    pub fn clear_log(&self) {
        self.state().log.clear();
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.state().tables.contains_key(table)
    }

    pub fn documents(&self, table: &str) -> Vec<Document> {
        self.state()
            .tables
            .get(table)
            .map(|docs| docs.iter().map(|d| decode_document(d).expect("stored json")).collect())
            .unwrap_or_default()
    }

    fn check_failure(&self, sql: &str) -> Result<(), DbError> {
        let state = self.state();
        match state.failures.iter().find(|(prefix, _)| sql.starts_with(prefix)) {
            Some((_, message)) => Err(DbError::QueryFailed {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn table_named_in(&self, sql: &str) -> Option<String> {
        let state = self.state();
        state
            .tables
            .keys()
            .find(|t| {
                let quoted = self.grammar.quote_identifier(t);
                sql.contains(&format!("FROM {}", quoted))
                    || sql.contains(&format!("INTO {}", quoted))
                    || sql.starts_with(&format!("UPDATE {}", quoted))
            })
            .cloned()
    }

    fn document_id(encoded: &str) -> Option<String> {
        decode_document(encoded)
            .ok()
            .and_then(|d| d.get("_id").and_then(Value::as_str).map(str::to_string))
    }
}

/// Read a quoted identifier at the start of `s`, returning it and the rest.
fn read_identifier(s: &str) -> Option<(String, &str)> {
    let quote = s.chars().next().filter(|c| *c == '`' || *c == '"')?;
    let mut name = String::new();
    let mut chars = s[1..].char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == quote {
            if chars.peek().map(|(_, next)| *next) == Some(quote) {
                name.push(quote);
                chars.next();
                continue;
            }
            return Some((name, &s[i + 2..]));
        }
        name.push(c);
    }
    None
}

impl Connection for StubConnection {
    fn backend_name(&self) -> &'static str {
        "Stub"
    }

    fn execute(&mut self, sql: &str, params: &[&str]) -> Result<u64, DbError> {
        self.state().log.push(Recorded {
            sql: sql.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
        });
        self.check_failure(sql)?;

        if let Some(rest) = sql.strip_prefix("CREATE TABLE IF NOT EXISTS ") {
            if let Some((table, _)) = read_identifier(rest) {
                self.state().tables.entry(table).or_default();
            }
            return Ok(0);
        }
        if let Some(rest) = sql.strip_prefix("DROP TABLE IF EXISTS ") {
            if let Some((table, _)) = read_identifier(rest) {
                self.state().tables.remove(&table);
            }
            return Ok(0);
        }
        let rename = sql
            .strip_prefix("RENAME TABLE ")
            .or_else(|| sql.strip_prefix("ALTER TABLE "));
        if let Some(rest) = rename {
            if let Some((from, rest)) = read_identifier(rest) {
                let rest = rest
                    .trim_start_matches(" TO ")
                    .trim_start_matches(" RENAME TO ");
                if let Some((to, _)) = read_identifier(rest) {
                    let mut state = self.state();
                    if let Some(docs) = state.tables.remove(&from) {
                        state.tables.insert(to, docs);
                    }
                }
            }
            return Ok(0);
        }

        let Some(table) = self.table_named_in(sql) else {
            return Ok(0);
        };

        if sql.starts_with("INSERT INTO ") {
            let document = params.first().map(|p| p.to_string()).unwrap_or_default();
            let mut state = self.state();
            let docs = state.tables.entry(table).or_default();
            let id = Self::document_id(&document);
            if id.is_some() && docs.iter().any(|d| Self::document_id(d) == id) {
                return Err(DbError::QueryFailed {
                    message: "duplicate key value violates unique constraint".to_string(),
                });
            }
            docs.push(document);
            return Ok(1);
        }

        let grammar = Arc::clone(&self.grammar);
        let matches_id = |doc: &String| {
            Self::document_id(doc).is_some_and(|id| sql.ends_with(&grammar.id_predicate(&id)))
        };

        let mut state = self.state();
        let docs = state.tables.entry(table).or_default();

        if sql.starts_with("UPDATE ") {
            let replacement = params.first().map(|p| p.to_string()).unwrap_or_default();
            let mut affected = 0;
            for doc in docs.iter_mut().filter(|d| matches_id(d)) {
                *doc = replacement.clone();
                affected += 1;
            }
            return Ok(affected);
        }

        if sql.starts_with("DELETE FROM ") {
            let before = docs.len();
            if sql.contains(" WHERE ") {
                docs.retain(|d| !matches_id(d));
            } else {
                docs.clear();
            }
            return Ok((before - docs.len()) as u64);
        }

        Ok(0)
    }

    fn query(&mut self, sql: &str) -> Result<Vec<Row>, DbError> {
        self.state().log.push(Recorded {
            sql: sql.to_string(),
            params: Vec::new(),
        });
        self.check_failure(sql)?;

        if let Some(rows) = self.state().responses.get(sql) {
            return Ok(rows.clone());
        }

        if sql == self.grammar.server_version_sql() {
            return Ok(vec![vec![Some(self.version.clone())]]);
        }

        if sql.starts_with("SHOW TABLES LIKE ") || sql.starts_with("SELECT to_regclass(") {
            let state = self.state();
            let existing = state
                .tables
                .keys()
                .find(|t| self.grammar.exists_check_sql(t) == sql);
            return Ok(match (existing, self.grammar.dialect()) {
                (Some(t), _) => vec![vec![Some(t.clone())]],
                (None, Dialect::Mysql) => Vec::new(),
                (None, Dialect::Postgres) => vec![vec![None]],
            });
        }

        let Some(table) = self.table_named_in(sql) else {
            return Ok(Vec::new());
        };
        let state = self.state();
        let docs = state.tables.get(&table).cloned().unwrap_or_default();

        if sql.starts_with("SELECT COUNT(*)") {
            return Ok(vec![vec![Some(docs.len().to_string())]]);
        }

        if sql.starts_with("SELECT 1 ") {
            let grammar = &self.grammar;
            let found = docs.iter().any(|d| {
                Self::document_id(d)
                    .is_some_and(|id| sql.contains(&grammar.id_predicate(&id)))
            });
            return Ok(if found { vec![vec![Some("1".to_string())]] } else { Vec::new() });
        }

        // WHERE clauses are not evaluated; unfiltered reads see every document
        Ok(docs.into_iter().map(|d| vec![Some(d)]).collect())
    }
}

/// The two-document fixture used across store tests.
pub fn fixture_documents() -> Vec<Document> {
    let docs = json!([
        {"_id": "000000000000000000000001", "content": "Lorem ipsum", "array": ["foo"], "_o": 1},
        {"_id": "000000000000000000000002", "content": "Etiam tempor", "array": ["foo", "bar"], "_o": 2}
    ]);
    match docs {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Build a document from a JSON object literal.
pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// A driver over a stub that already holds the fixture in `table`.
pub fn fixture_driver(dialect: Dialect, table: &str) -> (Driver, StubConnection) {
    let stub = StubConnection::new(dialect).with_table(table, &fixture_documents());
    let driver = Driver::new(Box::new(stub.clone()), dialect).expect("stub driver");
    stub.clear_log();
    (driver, stub)
}
