use serde_derive::{Deserialize, Serialize};

/// Storage settings for an `AvlTree<T, C>`.
///
/// # Examples
///
/// ```
/// use avl_collections::avl_tree::Config;
///
/// let config = Config {
///     max_len: Some(100),
///     ..Config::default()
/// };
/// assert_eq!(config.chunk_size, 1024);
/// ```
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Config {
    /// Number of nodes allocated together in one chunk.
    pub chunk_size: usize,
    /// Maximum number of values the tree will hold. Inserting past it fails with
    /// `Error::AllocationFailure`.
    pub max_len: Option<usize>,
    /// Maximum number of cursors registered with the tree at once. Creating a cursor past it
    /// fails with `Error::AllocationFailure`.
    pub max_cursors: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            chunk_size: 1024,
            max_len: None,
            max_cursors: None,
        }
    }
}
