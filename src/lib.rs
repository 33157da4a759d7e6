//! An ordered set backed by an avl tree, with cursors whose validity is tracked against mutation
//! of the tree.
//!
//! # Examples
//!
//! ```
//! use avl_collections::avl_tree::AvlTree;
//!
//! let mut tree = AvlTree::new();
//! for key in 0..100 {
//!     tree.insert(key).unwrap();
//! }
//!
//! let cursor = tree.find_cursor(&10).unwrap();
//! assert_eq!(tree.dereference(&cursor), Some(&10));
//!
//! assert_eq!(tree.remove(&10), Some(10));
//! assert!(!tree.is_valid(&cursor));
//! ```

pub mod arena;
pub mod avl_tree;
