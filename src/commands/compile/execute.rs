use std::error::Error;

use serde::Serialize;

use super::{CompileCmd, StatementKind};
use crate::commands::{parse_filter_arg, parse_sort_arg};
use crate::queries::builder::compilers::{grammar_for, Dialect};
use crate::queries::builder::QueryBuilder;
use crate::queries::FindOptions;

/// Result of the compile command
#[derive(Debug, Serialize)]
pub struct CompileResult {
    pub dialect: Dialect,
    pub statement: StatementKind,
    pub sql: String,
}

impl CompileCmd {
    /// Compile without a connection; only the grammar is needed.
    pub fn compile(self) -> Result<CompileResult, Box<dyn Error>> {
        let builder = QueryBuilder::new(grammar_for(self.dialect));
        let filter = parse_filter_arg(&self.filter)?;

        let sql = match self.statement {
            StatementKind::Select => {
                let options = FindOptions::new()
                    .sort(parse_sort_arg(self.sort.as_deref())?)
                    .limit(self.limit)
                    .skip(self.skip);
                builder.build_select(&self.collection, &filter, &options)?
            }
            StatementKind::Count => builder.build_count(&self.collection, &filter)?,
            StatementKind::Delete => builder.build_delete(&self.collection, &filter)?,
        };

        Ok(CompileResult {
            dialect: self.dialect,
            statement: self.statement,
            sql,
        })
    }
}
