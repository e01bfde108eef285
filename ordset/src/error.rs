use thiserror::Error;

/// Result type alias for tree operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by [`RedBlackTree`] operations.
///
/// [`RedBlackTree`]: crate::RedBlackTree
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The requested key is not present in the tree.
    #[error("key not found")]
    NotFound,
}
