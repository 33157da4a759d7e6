//! Self-balancing binary search tree where the heights of the two child subtrees of any node
//! differ by at most one, with cursors that detect mutation of the tree.

mod compare;
mod config;
mod cursor;
mod error;
mod node;
mod tree;

pub use self::compare::{Comparator, Natural};
pub use self::config::Config;
pub use self::cursor::Cursor;
pub use self::error::{Error, Result};
pub use self::tree::{AvlTree, Iter};
