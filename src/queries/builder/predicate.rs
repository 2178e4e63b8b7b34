//! Criteria-tree to SQL boolean expression compiler.
//!
//! A criteria tree maps field paths to either a literal (implicit `$eq`) or
//! an operator mapping such as `{"$gte": 2, "$lt": 5}`. The top level may also
//! carry `$and` / `$or` lists of nested criteria. Compilation is written once
//! against `DialectGrammar`; every dialect difference lives in the grammar.
//!
//! Errors are raised while compiling, before any SQL reaches a connection.

use serde_json::{Map, Value};

use super::compilers::DialectGrammar;
use super::operator::{Logical, Operator};
use crate::db::{is_truthy, type_name, DbError};

const ALWAYS_FALSE: &str = "1 = 0";
const ALWAYS_TRUE: &str = "1 = 1";

/// Compiles criteria trees for one dialect.
pub struct PredicateCompiler<'a> {
    grammar: &'a dyn DialectGrammar,
}

fn malformed(op: Operator, message: impl Into<String>) -> DbError {
    DbError::MalformedOperand {
        operator: op.to_string(),
        message: message.into(),
    }
}

/// Join fragments, parenthesising when more than one is present.
fn group(fragments: Vec<String>, glue: &str) -> Option<String> {
    match fragments.len() {
        0 => None,
        1 => fragments.into_iter().next(),
        _ => Some(format!("({})", fragments.join(glue))),
    }
}

/// Strip `/…/flags` delimiters from a regular expression.
fn strip_delimiters(pattern: &str) -> &str {
    if let Some(rest) = pattern.strip_prefix('/') {
        if let Some(end) = rest.rfind('/') {
            return &rest[..end];
        }
    }
    pattern.trim_matches('/')
}

impl<'a> PredicateCompiler<'a> {
    pub fn new(grammar: &'a dyn DialectGrammar) -> Self {
        Self { grammar }
    }

    /// Compile a criteria tree into a SQL boolean expression.
    ///
    /// Returns `None` when the criteria impose no constraint.
    pub fn compile(&self, criteria: &Map<String, Value>) -> Result<Option<String>, DbError> {
        let fragments = self.compile_criteria(criteria)?;
        if fragments.is_empty() {
            return Ok(None);
        }
        Ok(Some(fragments.join(" AND ")))
    }

    fn compile_criteria(&self, criteria: &Map<String, Value>) -> Result<Vec<String>, DbError> {
        let mut fragments = Vec::new();

        for (key, value) in criteria {
            if let Some(logical) = Logical::parse(key) {
                fragments.extend(self.compile_logical(logical, value)?);
            } else if key.starts_with('$') {
                return Err(DbError::UnsupportedOperator {
                    operator: key.clone(),
                });
            } else {
                fragments.extend(self.compile_field(key, value)?);
            }
        }

        Ok(fragments)
    }

    fn compile_logical(&self, logical: Logical, value: &Value) -> Result<Option<String>, DbError> {
        let invalid = |message: &str| DbError::MalformedOperand {
            operator: logical.as_str().to_string(),
            message: message.to_string(),
        };

        let items = match value {
            Value::Array(items) if !items.is_empty() => items,
            _ => return Err(invalid("expected a non-empty array of criteria")),
        };

        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            let sub = item
                .as_object()
                .ok_or_else(|| invalid("every element must be a criteria object"))?;
            let part = group(self.compile_criteria(sub)?, " AND ")
                .unwrap_or_else(|| ALWAYS_TRUE.to_string());
            parts.push(part);
        }

        Ok(Some(format!("({})", parts.join(logical.glue()))))
    }

    fn compile_field(&self, field: &str, value: &Value) -> Result<Vec<String>, DbError> {
        match value {
            Value::Object(conditions) => self.compile_conditions(field, conditions),
            Value::Array(_) => Err(malformed(
                Operator::Eq,
                format!("array literal for '{}' needs an explicit operator", field),
            )),
            scalar => Ok(self.compile_operator(Operator::Eq, field, scalar)?.into_iter().collect()),
        }
    }

    fn compile_conditions(
        &self,
        field: &str,
        conditions: &Map<String, Value>,
    ) -> Result<Vec<String>, DbError> {
        let mut fragments = Vec::with_capacity(conditions.len());
        for (key, operand) in conditions {
            let op = Operator::parse(key)?;
            if let Some(fragment) = self.compile_operator(op, field, operand)? {
                fragments.push(fragment);
            }
        }
        Ok(fragments)
    }

    /// `$in` / `$nin` over a non-empty list.
    ///
    /// Booleans and nulls cannot share the text `IN` list: they go through
    /// the same JSON and null checks as `$eq`, joined with OR for `$in` and
    /// AND for `$nin`.
    fn compile_membership(&self, op: Operator, field: &str, values: &[Value]) -> Result<String, DbError> {
        let g = self.grammar;
        let member = op == Operator::In;

        let mut terms = Vec::new();
        let (scalars, special): (Vec<&Value>, Vec<&Value>) =
            values.iter().partition(|v| !v.is_boolean() && !v.is_null());
        if !scalars.is_empty() {
            let quoted = scalars
                .iter()
                .map(|v| g.quote_literal(v))
                .collect::<Result<Vec<_>, _>>()?;
            let keyword = if member { "IN" } else { "NOT IN" };
            terms.push(format!("{} {} ({})", g.text_selector(field), keyword, quoted.join(", ")));
        }
        for value in special {
            if value.is_null() {
                terms.push(g.null_check_sql(field, member));
            } else {
                let comparison = if member { "=" } else { "<>" };
                terms.push(format!("{} {} {}", g.json_selector(field), comparison, g.json_literal(value)?));
            }
        }

        if terms.len() == 1 {
            return Ok(terms.remove(0));
        }
        let glue = if member { " OR " } else { " AND " };
        Ok(format!("({})", terms.join(glue)))
    }

    fn compile_operator(
        &self,
        op: Operator,
        field: &str,
        operand: &Value,
    ) -> Result<Option<String>, DbError> {
        let g = self.grammar;

        let sql = match op {
            Operator::Eq | Operator::Ne if operand.is_null() => {
                g.null_check_sql(field, op == Operator::Eq)
            }
            // Booleans compare as JSON so `true` never coerces to 1
            Operator::Eq | Operator::Ne if operand.is_boolean() => format!(
                "{} {} {}",
                g.json_selector(field),
                op.comparison().unwrap_or("="),
                g.json_literal(operand)?
            ),
            Operator::Eq | Operator::Ne | Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
                format!(
                    "{} {} {}",
                    g.text_selector(field),
                    op.comparison().unwrap_or("="),
                    g.quote_literal(operand)?
                )
            }

            Operator::In | Operator::Nin => {
                let values = operand
                    .as_array()
                    .ok_or_else(|| malformed(op, format!("expected array, got {}", type_name(operand))))?;
                if values.is_empty() {
                    let constant = if op == Operator::In { ALWAYS_FALSE } else { ALWAYS_TRUE };
                    return Ok(Some(constant.to_string()));
                }
                self.compile_membership(op, field, values)?
            }

            Operator::Has => {
                if operand.is_array() || operand.is_object() {
                    return Err(malformed(op, format!("expected scalar, got {}", type_name(operand))));
                }
                g.contains_sql(field, operand)?
            }

            Operator::All => {
                let values = operand
                    .as_array()
                    .ok_or_else(|| malformed(op, format!("expected array, got {}", type_name(operand))))?;
                if values.is_empty() {
                    return Ok(Some(ALWAYS_FALSE.to_string()));
                }
                g.contains_all_sql(field, values)?
            }

            Operator::Regex => {
                let pattern = operand
                    .as_str()
                    .ok_or_else(|| malformed(op, format!("expected string, got {}", type_name(operand))))?;
                g.regex_sql(field, strip_delimiters(pattern))
            }

            Operator::Size => {
                let length = operand
                    .as_i64()
                    .ok_or_else(|| malformed(op, format!("expected integer, got {}", operand)))?;
                g.array_length_sql(field, length)
            }

            Operator::Mod => {
                let (divisor, remainder) = match operand.as_array().map(Vec::as_slice) {
                    Some([divisor]) => (divisor, None),
                    Some([divisor, remainder]) => (divisor, Some(remainder)),
                    _ => return Err(malformed(op, "expected [divisor, remainder]")),
                };
                let divisor = divisor
                    .as_i64()
                    .ok_or_else(|| malformed(op, "divisor must be an integer"))?;
                if divisor == 0 {
                    return Err(malformed(op, "divisor must not be zero"));
                }
                let remainder = match remainder {
                    Some(r) => r
                        .as_i64()
                        .ok_or_else(|| malformed(op, "remainder must be an integer"))?,
                    None => 0,
                };
                g.modulo_sql(field, divisor, remainder)
            }

            Operator::Exists => g.null_check_sql(field, !is_truthy(operand)),

            Operator::Text => {
                let needle = match operand {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    other => {
                        return Err(malformed(op, format!("options are not supported ({})", type_name(other))))
                    }
                };
                g.like_sql(field, &needle)
            }

            Operator::Not => {
                let inner = match operand {
                    Value::Object(conditions) => self.compile_conditions(field, conditions)?,
                    Value::Array(_) => return Err(malformed(op, "expected operator mapping or scalar")),
                    scalar => self.compile_operator(Operator::Eq, field, scalar)?.into_iter().collect(),
                };
                if inner.is_empty() {
                    return Ok(None);
                }
                format!("NOT ({})", inner.join(" AND "))
            }

            Operator::Options => return Ok(None),
        };

        Ok(Some(sql))
    }
}
