//! The iterator state machine every source and operator is built on.
//!
//! [`AsyncIter`] owns the lifecycle (`Fresh → Active → Released`), the current item and the
//! cancellation token. Operator-specific behaviour lives in an [`IterLogic`] implementation,
//! which only has to know how to acquire its upstream enumerators, how to take one step, and
//! how to let go of what it holds. The machine guarantees the rest:
//!
//! - setup runs exactly once, on the first `advance`
//! - each step is raced against cancellation
//! - exhaustion, failure and cancellation all release the logic before `advance` returns
//! - after release, `advance` reports [`Outcome::Exhausted`] forever
//!
//! # Examples
//!
//! ```rust
//! use async_trait::async_trait;
//! use lazyseq::cancel::CancellationToken;
//! use lazyseq::iter::{AsyncIter, IterLogic, Lifecycle};
//! use lazyseq::{Enumerator, Result};
//!
//! struct Countdown(u32);
//!
//! #[async_trait]
//! impl IterLogic for Countdown {
//!     type Item = u32;
//!     const NAME: &'static str = "countdown";
//!
//!     fn acquire(&mut self, _cancel: &CancellationToken) -> Result<()> {
//!         Ok(())
//!     }
//!
//!     async fn step(&mut self, _cancel: &CancellationToken) -> Result<Option<u32>> {
//!         if self.0 == 0 {
//!             return Ok(None);
//!         }
//!         self.0 -= 1;
//!         Ok(Some(self.0))
//!     }
//!
//!     async fn release(&mut self) {}
//!
//!     fn fresh(&self) -> Self {
//!         Countdown(3)
//!     }
//! }
//!
//! # futures::executor::block_on(async {
//! let mut cursor = AsyncIter::new(Countdown(2), CancellationToken::new());
//! assert_eq!(cursor.lifecycle(), Lifecycle::Fresh);
//! assert_eq!(cursor.next_item().await.unwrap(), Some(1));
//! assert_eq!(cursor.lifecycle(), Lifecycle::Active);
//! assert_eq!(cursor.next_item().await.unwrap(), Some(0));
//! assert_eq!(cursor.next_item().await.unwrap(), None);
//! assert_eq!(cursor.lifecycle(), Lifecycle::Released);
//! # });
//! ```

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::{
    cancel::{guarded, CancellationToken},
    enumerator::Enumerator,
    error::Result,
    outcome::Outcome,
};

/// Lifecycle of an [`AsyncIter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// No upstream resources acquired yet
    Fresh,
    /// Upstream resources held; operator stage state is valid
    Active,
    /// Everything released; the enumerator only reports exhaustion
    Released,
}

/// Operator-specific stage logic driven by an [`AsyncIter`].
#[async_trait]
pub trait IterLogic: Send + 'static {
    /// Type of produced items
    type Item: Send + 'static;

    /// Operator name used in log events and overflow errors.
    const NAME: &'static str;

    /// One-time setup: acquire upstream enumerators and initialise stage state.
    fn acquire(&mut self, cancel: &CancellationToken) -> Result<()>;

    /// Runs one unit of work, returning the next item or `None` once no stage has anything left.
    async fn step(&mut self, cancel: &CancellationToken) -> Result<Option<Self::Item>>;

    /// Releases every held upstream enumerator and drops accumulated state.
    ///
    /// Must tolerate being called before `acquire`, and after a step that was cancelled while
    /// it was releasing an upstream. A step releases upstreams in place and empties the slot
    /// afterwards; here each one is taken out of its slot so it is released once.
    async fn release(&mut self);

    /// A new logic with the same parameters and no progress.
    fn fresh(&self) -> Self
    where
        Self: Sized;
}

/// The shared enumerator implementation behind every sequence in this crate.
pub struct AsyncIter<L: IterLogic> {
    logic: L,
    lifecycle: Lifecycle,
    current: Option<L::Item>,
    cancel: CancellationToken,
}

impl<L: IterLogic> AsyncIter<L> {
    /// Wraps `logic` in a `Fresh` state machine observing `cancel`.
    pub fn new(logic: L, cancel: CancellationToken) -> Self {
        Self {
            logic,
            lifecycle: Lifecycle::Fresh,
            current: None,
            cancel,
        }
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Returns a brand-new `Fresh` enumerator over the same sequence, independent of this
    /// one's progress.
    pub fn fresh(&self) -> Self {
        Self::new(self.logic.fresh(), self.cancel.clone())
    }

    async fn settle(&mut self) {
        self.current = None;
        if self.lifecycle != Lifecycle::Released {
            self.logic.release().await;
            self.lifecycle = Lifecycle::Released;
            trace!(operator = L::NAME, "released");
        }
    }
}

#[async_trait]
impl<L: IterLogic> Enumerator for AsyncIter<L> {
    type Item = L::Item;

    async fn advance(&mut self) -> Result<Outcome> {
        match self.lifecycle {
            Lifecycle::Released => return Ok(Outcome::Exhausted),
            Lifecycle::Fresh => {
                if let Err(err) = self.logic.acquire(&self.cancel) {
                    debug!(operator = L::NAME, error = %err, "setup failed");
                    self.settle().await;
                    return Err(err);
                }
                self.lifecycle = Lifecycle::Active;
                trace!(operator = L::NAME, "acquired");
            }
            Lifecycle::Active => {}
        }

        self.current = None;
        let step = match guarded(&self.cancel, self.logic.step(&self.cancel)).await {
            Ok(step) => step,
            Err(err) => {
                debug!(operator = L::NAME, error = %err, "enumeration failed; releasing");
                self.settle().await;
                return Err(err);
            }
        };

        let (outcome, item) = Outcome::split(step);
        match outcome {
            Outcome::Produced => self.current = item,
            Outcome::Exhausted => self.settle().await,
        }
        Ok(outcome)
    }

    fn current(&self) -> Option<&Self::Item> {
        self.current.as_ref()
    }

    fn take_current(&mut self) -> Option<Self::Item> {
        self.current.take()
    }

    async fn release(&mut self) {
        self.settle().await
    }
}

impl<L: IterLogic> Drop for AsyncIter<L> {
    fn drop(&mut self) {
        if self.lifecycle == Lifecycle::Active {
            trace!(operator = L::NAME, "abandoned while active");
        }
    }
}

impl<L: IterLogic> std::fmt::Debug for AsyncIter<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncIter")
            .field("operator", &L::NAME)
            .field("lifecycle", &self.lifecycle)
            .field("has_current", &self.current.is_some())
            .finish()
    }
}
