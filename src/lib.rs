//! # Lazyseq: Composable Pull-Based Async Sequences
//!
//! Build pipelines over asynchronous sequences that do nothing until a consumer pulls, and
//! that give back every resource they hold as soon as the consumer is done.
//!
//! ## Core Traits
//!
//! - **[`Sequence`]**: An immutable, restartable description of an enumeration
//! - **[`Enumerator`]**: One stateful cursor over one enumeration
//! - **[`IterLogic`](iter::IterLogic)**: Operator stage logic driven by the shared
//!   [`AsyncIter`](iter::AsyncIter) state machine
//!
//! ## Key Features
//!
//! - **Lazy**: Nothing upstream is acquired before the first `advance`
//! - **Restartable**: Every `enumerate` call starts over, with fresh operator state
//! - **Cancellable**: One [`CancellationToken`] reaches every upstream enumerator
//! - **Leak-free**: Exhaustion, failure, cancellation and `release` all release upstreams,
//!   exactly once
//!
//! ## Example
//!
//! ```
//! use lazyseq::prelude::*;
//!
//! # futures::executor::block_on(async {
//! let orders = from_iter(vec![("ann", vec![3, 4]), ("bob", vec![]), ("cy", vec![5])]);
//!
//! let lines = orders.select_many_with(
//!     |(_, items)| from_iter(items),
//!     |(who, _), item| format!("{who}:{item}"),
//! );
//!
//! assert_eq!(to_vec(&lines).await.unwrap(), vec!["ann:3", "ann:4", "cy:5"]);
//! # });
//! ```
//!
//! ## Common Functions
//!
//! **Sources:**
//! - [`from_iter(iter)`](build::from_iter) - Enumerate a cloneable collection
//! - [`range(start, count)`](build::range) - Consecutive integers
//! - [`from_stream(factory)`](build::from_stream) - Bridge from a [`futures::Stream`]
//!
//! **Operators** (provided methods on [`Sequence`]):
//! - `select_many`, `flatten` - Expand each item into an inner sequence
//! - `scan`, `scan_seeded` - Running folds
//! - `intersect`, `except` - Set operations under an equality comparer
//! - `skip_last` - Withhold the final items
//! - `of_type` - Keep items of one runtime kind
//!
//! **Consumption:**
//! - [`to_vec(&seq)`](consume::to_vec) - Collect every item
//! - [`for_each(&seq, cancel, f)`](consume::for_each) - Visit every item

pub mod build;
pub mod cancel;
pub mod comparer;
pub mod compose;
pub mod consume;
pub mod enumerator;
pub mod error;
pub mod func;
pub mod iter;
pub mod outcome;
pub mod prelude;
pub mod sequence;
pub mod set;
pub mod validate;

#[cfg(test)]
mod testing;

pub use cancel::CancellationToken;
pub use enumerator::{BoxEnumerator, Enumerator};
pub use error::{Error, Result};
pub use outcome::Outcome;
pub use sequence::{BoxSequence, Sequence};
