//! Source sequences.
//!
//! Sources are the leaves of a pipeline. They own no upstream enumerators, so their
//! release only drops the cursor they hold.

mod iter;
mod range;
mod stream;

pub use iter::{defer, empty, from_iter, repeat, Defer, Empty, FromIter, Repeat};
pub use range::{range, Range};
pub use stream::{from_stream, try_from_stream, FromStream, TryFromStream};
