mod execute;
mod output;

pub use execute::InsertResult;

use clap::{ArgGroup, Args};
use std::path::PathBuf;

/// Insert one document or an array of documents
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["document", "file"])))]
#[command(after_help = "\
Examples:
  docsql insert -c blog/posts -d '{\"title\": \"Hello\"}'        # One document
  docsql insert -c blog/posts -d '[{\"n\": 1}, {\"n\": 2}]'        # Several documents
  docsql insert -c blog/posts --file posts.json                # From a file

Documents without an _id are assigned a fresh 24-character hex id.")]
pub struct InsertCmd {
    /// Collection id, e.g. `posts` or `blog/posts`
    #[arg(short, long)]
    pub collection: String,

    /// A JSON object, or an array of objects
    #[arg(short, long)]
    pub document: Option<String>,

    /// Read the JSON object or array from a file
    #[arg(long)]
    pub file: Option<PathBuf>,
}
