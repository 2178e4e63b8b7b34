mod execute;
mod output;

pub use execute::DropResult;

use clap::Args;

/// Drop a collection and its table
#[derive(Args, Debug)]
pub struct DropCmd {
    /// Collection id, e.g. `posts` or `blog/posts`
    #[arg(short, long)]
    pub collection: String,
}
