//! The closed set of query operators.

use std::fmt;

use crate::db::DbError;

/// A field-level query operator.
///
/// Parsing is strict: only the operators listed here are accepted and
/// anything else is a `DbError::UnsupportedOperator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
    Has,
    All,
    /// `$regex`, also spelled `$match` and `$preg`.
    Regex,
    Size,
    Mod,
    Exists,
    Text,
    Not,
    /// Companion of `$regex`; compiles to nothing.
    Options,
}

impl Operator {
    /// Parse an operator key such as `"$gte"`.
    pub fn parse(key: &str) -> Result<Self, DbError> {
        let op = match key {
            "$eq" => Operator::Eq,
            "$ne" => Operator::Ne,
            "$gt" => Operator::Gt,
            "$gte" => Operator::Gte,
            "$lt" => Operator::Lt,
            "$lte" => Operator::Lte,
            "$in" => Operator::In,
            "$nin" => Operator::Nin,
            "$has" => Operator::Has,
            "$all" => Operator::All,
            "$regex" | "$match" | "$preg" => Operator::Regex,
            "$size" => Operator::Size,
            "$mod" => Operator::Mod,
            "$exists" => Operator::Exists,
            "$text" => Operator::Text,
            "$not" => Operator::Not,
            "$options" => Operator::Options,
            // $fuzzy and the $func/$fn/$f callbacks have no SQL form
            other => {
                return Err(DbError::UnsupportedOperator {
                    operator: other.to_string(),
                })
            }
        };
        Ok(op)
    }

    /// SQL comparison symbol for the binary comparison operators.
    pub fn comparison(self) -> Option<&'static str> {
        match self {
            Operator::Eq => Some("="),
            Operator::Ne => Some("<>"),
            Operator::Gt => Some(">"),
            Operator::Gte => Some(">="),
            Operator::Lt => Some("<"),
            Operator::Lte => Some("<="),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
            Operator::In => "$in",
            Operator::Nin => "$nin",
            Operator::Has => "$has",
            Operator::All => "$all",
            Operator::Regex => "$regex",
            Operator::Size => "$size",
            Operator::Mod => "$mod",
            Operator::Exists => "$exists",
            Operator::Text => "$text",
            Operator::Not => "$not",
            Operator::Options => "$options",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logical {
    And,
    Or,
}

impl Logical {
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "$and" => Some(Logical::And),
            "$or" => Some(Logical::Or),
            _ => None,
        }
    }

    pub fn glue(self) -> &'static str {
        match self {
            Logical::And => " AND ",
            Logical::Or => " OR ",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Logical::And => "$and",
            Logical::Or => "$or",
        }
    }
}
