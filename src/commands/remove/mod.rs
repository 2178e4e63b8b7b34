mod execute;
mod output;

pub use execute::RemoveResult;

use clap::Args;

/// Delete documents matching a filter
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  docsql remove -c blog/posts -f '{\"_id\": \"65f1c0de0000000000000001\"}'
  docsql remove -c blog/posts -f '{}'                  # Everything

The filter is required; pass '{}' to delete every document.")]
pub struct RemoveCmd {
    /// Collection id, e.g. `posts` or `blog/posts`
    #[arg(short, long)]
    pub collection: String,

    /// Filter as a JSON object
    #[arg(short, long)]
    pub filter: String,
}
