//! CLI argument definitions.
//!
//! This module contains the top-level CLI structure and shared types.
//! Individual command definitions are in the `commands` module.

use clap::Parser;

use crate::commands::Command;
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about = "Query JSON documents stored in MySQL or PostgreSQL", long_about = None)]
pub struct Args {
    /// Database URL (mysql://, postgres://). Falls back to .docsql.json, then DATABASE_URL
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Log every SQL statement to stderr
    #[arg(short, long, default_value_t = false, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}
