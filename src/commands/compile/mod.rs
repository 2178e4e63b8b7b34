mod execute;
mod output;

pub use execute::CompileResult;

use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::queries::builder::compilers::Dialect;

/// Which statement to compile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    /// SELECT used by find
    #[default]
    Select,
    /// SELECT COUNT(*) used by count
    Count,
    /// DELETE used by remove
    Delete,
}

/// Print the SQL a filter compiles to, without connecting
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  docsql compile -d postgres -f '{\"tags\": {\"$all\": [\"a\", \"b\"]}}'
  docsql compile -d mysql -c blog/posts -f '{\"n\": {\"$gt\": 3}}' -s '{\"n\": -1}' -l 5
  docsql compile -d mysql -f '{\"draft\": true}' --statement delete")]
pub struct CompileCmd {
    /// SQL dialect to compile for
    #[arg(short, long, value_enum)]
    pub dialect: Dialect,

    /// Collection id used as the table name
    #[arg(short, long, default_value = "collection")]
    pub collection: String,

    /// Filter as a JSON object
    #[arg(short, long, default_value = "{}")]
    pub filter: String,

    /// Sort as a JSON object mapping fields to 1 or -1 (select only)
    #[arg(short, long)]
    pub sort: Option<String>,

    /// Maximum number of documents (select only, 0 = unlimited)
    #[arg(short, long, default_value_t = 0)]
    pub limit: u64,

    /// Number of documents to skip (select only)
    #[arg(long, default_value_t = 0)]
    pub skip: u64,

    /// Statement to compile
    #[arg(long, value_enum, default_value_t = StatementKind::Select)]
    pub statement: StatementKind,
}
