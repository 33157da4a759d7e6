use std::error;
use std::fmt;
use std::result;

/// Convenience `Error` enum for `avl_tree`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// The tree could not store another node or cursor. The tree is left exactly as it was
    /// before the failing operation.
    AllocationFailure,
    /// A cursor was used after traversal ran past either end or after the tree was mutated.
    InvalidCursor,
    /// A cursor was presented to a tree that did not create it.
    ForeignCursor,
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::AllocationFailure => write!(f, "allocation failed"),
            Error::InvalidCursor => write!(f, "cursor is invalid"),
            Error::ForeignCursor => write!(f, "cursor belongs to a different tree"),
        }
    }
}

/// Convenience `Result` type for `avl_tree`.
pub type Result<T> = result::Result<T, Error>;
