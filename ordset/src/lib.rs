#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

mod error;
mod red_black_tree;

pub use error::{Error, Result};
pub use red_black_tree::{Iter, RedBlackTree};
