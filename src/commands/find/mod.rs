mod execute;
mod output;

pub use execute::FindResult;

use clap::Args;

/// List documents matching a filter
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  docsql find -c blog/posts                                  # Every document
  docsql find -c blog/posts -f '{\"tags\": {\"$has\": \"rust\"}}'  # Array membership
  docsql find -c blog/posts -s '{\"created\": -1}' -l 10       # Newest ten
  docsql find -c blog/posts --fields '{\"title\": 1}'           # Only _id and title")]
pub struct FindCmd {
    /// Collection id, e.g. `posts` or `blog/posts`
    #[arg(short, long)]
    pub collection: String,

    /// Filter as a JSON object
    #[arg(short, long, default_value = "{}")]
    pub filter: String,

    /// Projection as a JSON object; truthy values include, falsy values exclude
    #[arg(long)]
    pub fields: Option<String>,

    /// Sort as a JSON object mapping fields to 1 (ascending) or -1 (descending)
    #[arg(short, long)]
    pub sort: Option<String>,

    /// Maximum number of documents to return (0 = unlimited)
    #[arg(short, long, default_value_t = 0)]
    pub limit: u64,

    /// Number of matching documents to skip
    #[arg(long, default_value_t = 0)]
    pub skip: u64,
}
