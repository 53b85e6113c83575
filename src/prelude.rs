//! Commonly used imports
//!
//! Use `use lazyseq::prelude::*;` for quick access to the most common types and functions.

// Core types
pub use crate::{BoxSequence, CancellationToken, Enumerator, Error, Outcome, Result, Sequence};

// Sources
pub use crate::build::{
    defer, empty, from_iter, from_stream, range, repeat, try_from_stream,
};

// Comparers
pub use crate::comparer::{EqualityComparer, KeyEq, NaturalEq};

// Consumption
pub use crate::consume::{count, for_each, to_vec, to_vec_with};
