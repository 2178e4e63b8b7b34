mod execute;
mod output;

pub use execute::CountResult;

use clap::Args;

/// Count documents matching a filter
#[derive(Args, Debug)]
#[command(after_help = "\
Examples:
  docsql count -c blog/posts                            # All documents
  docsql count -c blog/posts -f '{\"draft\": false}'      # Published posts")]
pub struct CountCmd {
    /// Collection id, e.g. `posts` or `blog/posts`
    #[arg(short, long)]
    pub collection: String,

    /// Filter as a JSON object
    #[arg(short, long, default_value = "{}")]
    pub filter: String,
}
