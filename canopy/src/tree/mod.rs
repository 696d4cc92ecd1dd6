mod filter;
mod materialize;

pub use filter::{FilteredView, TreeFilter};
pub use materialize::{materialize, TreeNode};
