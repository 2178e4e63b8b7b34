//! Command definitions and implementations.
//!
//! Each command is defined in its own module with:
//! - The command struct with clap attributes for CLI parsing
//! - An `Execute` implementation producing a serializable result
//! - An `Outputable` implementation for table rendering

mod compile;
mod count;
mod drop;
mod find;
mod insert;
mod remove;

pub use compile::{CompileCmd, StatementKind};
pub use count::CountCmd;
pub use drop::DropCmd;
pub use find::FindCmd;
pub use insert::InsertCmd;
pub use remove::RemoveCmd;

use clap::Subcommand;
use serde_json::Value;
use std::error::Error;

use crate::db::{DatabaseConfig, Document};
use crate::output::{OutputFormat, Outputable};
use crate::queries::{Filter, SortSpec};
use crate::store::Driver;

/// Trait for executing commands with command-specific result types.
pub trait Execute {
    type Output: Outputable;

    fn execute(self, driver: &Driver) -> Result<Self::Output, Box<dyn Error>>;
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List documents matching a filter
    Find(FindCmd),

    /// Count documents matching a filter
    Count(CountCmd),

    /// Insert one document or an array of documents
    Insert(InsertCmd),

    /// Delete documents matching a filter
    Remove(RemoveCmd),

    /// Drop a collection and its table
    Drop(DropCmd),

    /// Print the SQL a filter compiles to, without connecting
    Compile(CompileCmd),

    /// Catch-all for unknown commands
    #[command(external_subcommand)]
    Unknown(Vec<String>),
}

impl Command {
    /// Execute the command and return formatted output.
    ///
    /// Only commands that touch data open a connection; `compile` runs offline.
    pub fn run(self, database_url: Option<&str>, format: OutputFormat) -> Result<String, Box<dyn Error>> {
        match self {
            Command::Compile(cmd) => Ok(cmd.compile()?.format(format)),
            Command::Unknown(args) => {
                Err(format!("Unknown command: {}", args.first().unwrap_or(&String::new())).into())
            }
            command => {
                let driver = connect(database_url)?;
                command.run_with(&driver, format)
            }
        }
    }

    /// Execute the command against an existing driver.
    pub fn run_with(self, driver: &Driver, format: OutputFormat) -> Result<String, Box<dyn Error>> {
        match self {
            Command::Find(cmd) => {
                let result = cmd.execute(driver)?;
                Ok(result.format(format))
            }
            Command::Count(cmd) => {
                let result = cmd.execute(driver)?;
                Ok(result.format(format))
            }
            Command::Insert(cmd) => {
                let result = cmd.execute(driver)?;
                Ok(result.format(format))
            }
            Command::Remove(cmd) => {
                let result = cmd.execute(driver)?;
                Ok(result.format(format))
            }
            Command::Drop(cmd) => {
                let result = cmd.execute(driver)?;
                Ok(result.format(format))
            }
            Command::Compile(cmd) => Ok(cmd.compile()?.format(format)),
            Command::Unknown(args) => {
                Err(format!("Unknown command: {}", args.first().unwrap_or(&String::new())).into())
            }
        }
    }
}

/// Open a driver from an explicit URL, or from the configuration chain.
fn connect(database_url: Option<&str>) -> Result<Driver, Box<dyn Error>> {
    let config = match database_url {
        Some(url) => DatabaseConfig::from_url(url)?,
        None => DatabaseConfig::resolve()?,
    };
    Ok(Driver::connect(&config)?)
}

/// Parse a JSON command-line argument, naming the flag on failure.
pub(crate) fn parse_json_arg(flag: &str, text: &str) -> Result<Value, Box<dyn Error>> {
    serde_json::from_str(text).map_err(|e| format!("Invalid JSON in {}: {}", flag, e).into())
}

/// Parse a JSON argument that must be an object.
pub(crate) fn parse_object_arg(flag: &str, text: &str) -> Result<Document, Box<dyn Error>> {
    match parse_json_arg(flag, text)? {
        Value::Object(map) => Ok(map),
        other => Err(format!(
            "{} must be a JSON object, got {}",
            flag,
            crate::db::type_name(&other)
        )
        .into()),
    }
}

pub(crate) fn parse_filter_arg(text: &str) -> Result<Filter, Box<dyn Error>> {
    Ok(Filter::from_value(parse_json_arg("--filter", text)?)?)
}

pub(crate) fn parse_sort_arg(text: Option<&str>) -> Result<SortSpec, Box<dyn Error>> {
    match text {
        Some(text) => Ok(SortSpec::from_document(&parse_object_arg("--sort", text)?)?),
        None => Ok(SortSpec::default()),
    }
}
