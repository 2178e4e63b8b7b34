//! Output formatting for command results.
//!
//! Supports two output formats: table (human-readable) and JSON.

use clap::ValueEnum;
use serde::Serialize;

use crate::db::Document;

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Trait for types that can be formatted for output
pub trait Outputable: Serialize {
    /// Format as a human-readable table
    fn to_table(&self) -> String;

    /// Format according to the specified output format
    fn format(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => self.to_table(),
            OutputFormat::Json => serde_json::to_string_pretty(self).unwrap_or_default(),
        }
    }
}

/// Render documents one per line as compact JSON, indented under a header.
///
/// `empty` is printed instead of the listing when there are no documents.
pub fn document_lines(header: String, documents: &[Document], empty: &str) -> String {
    let mut lines = vec![header, String::new()];

    if documents.is_empty() {
        lines.push(empty.to_string());
        return lines.join("\n");
    }

    for document in documents {
        lines.push(format!(
            "  {}",
            serde_json::to_string(document).unwrap_or_default()
        ));
    }

    lines.join("\n")
}
