//! The pull-side cursor of an asynchronous sequence.
//!
//! An [`Enumerator`] is a single forward cursor over one enumeration. The consumer drives it
//! with [`advance`](Enumerator::advance), reads [`current`](Enumerator::current) after each
//! [`Outcome::Produced`], and calls [`release`](Enumerator::release) once it is done.
//!
//! ```rust
//! use lazyseq::prelude::*;
//!
//! # futures::executor::block_on(async {
//! let mut cursor = from_iter(vec![1, 2]).enumerator();
//! assert_eq!(cursor.advance().await.unwrap(), Outcome::Produced);
//! assert_eq!(cursor.current(), Some(&1));
//! assert_eq!(cursor.next_item().await.unwrap(), Some(2));
//! assert_eq!(cursor.advance().await.unwrap(), Outcome::Exhausted);
//! cursor.release().await;
//! # });
//! ```

use async_trait::async_trait;
use either::Either;
use futures::stream::{self, BoxStream, StreamExt};

use crate::{error::Result, outcome::Outcome};

/// A single stateful cursor produced by enumerating a [`Sequence`](crate::Sequence).
///
/// Access is single-threaded: at most one `advance` may be outstanding at a time.
#[async_trait]
pub trait Enumerator: Send {
    /// Type of produced items
    type Item: Send + 'static;

    /// Pulls the next item.
    ///
    /// On `Produced` the item is available through [`current`](Enumerator::current).
    /// Once `Exhausted` has been reported (or the enumerator was released) every later call
    /// reports `Exhausted` again.
    async fn advance(&mut self) -> Result<Outcome>;

    /// The item produced by the last successful `advance`, if any.
    fn current(&self) -> Option<&Self::Item>;

    /// Moves the current item out; `current()` returns `None` afterwards.
    fn take_current(&mut self) -> Option<Self::Item>;

    /// Releases every upstream resource. Safe to call repeatedly and before the first `advance`.
    async fn release(&mut self);

    /// Advances and takes the produced item in one call.
    async fn next_item(&mut self) -> Result<Option<Self::Item>> {
        match self.advance().await? {
            Outcome::Produced => Ok(self.take_current()),
            Outcome::Exhausted => Ok(None),
        }
    }

    /// Bridges this enumerator into a [`futures::Stream`].
    ///
    /// The stream ends after exhaustion or right after yielding the first error.
    fn into_stream(self) -> BoxStream<'static, Result<Self::Item>>
    where
        Self: Sized + 'static,
    {
        stream::unfold(Some(self), |state| async move {
            let mut cursor = state?;
            match cursor.next_item().await {
                Ok(Some(item)) => Some((Ok(item), Some(cursor))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
        .boxed()
    }
}

/// Type-erased enumerator.
pub type BoxEnumerator<T> = Box<dyn Enumerator<Item = T>>;

#[async_trait]
impl<T> Enumerator for Box<dyn Enumerator<Item = T>>
where
    T: Send + 'static,
{
    type Item = T;

    async fn advance(&mut self) -> Result<Outcome> {
        (**self).advance().await
    }

    fn current(&self) -> Option<&T> {
        (**self).current()
    }

    fn take_current(&mut self) -> Option<T> {
        (**self).take_current()
    }

    async fn release(&mut self) {
        (**self).release().await
    }
}

#[async_trait]
impl<L, R> Enumerator for Either<L, R>
where
    L: Enumerator,
    R: Enumerator<Item = L::Item>,
{
    type Item = L::Item;

    async fn advance(&mut self) -> Result<Outcome> {
        match self {
            Either::Left(l) => l.advance().await,
            Either::Right(r) => r.advance().await,
        }
    }

    fn current(&self) -> Option<&Self::Item> {
        match self {
            Either::Left(l) => l.current(),
            Either::Right(r) => r.current(),
        }
    }

    fn take_current(&mut self) -> Option<Self::Item> {
        match self {
            Either::Left(l) => l.take_current(),
            Either::Right(r) => r.take_current(),
        }
    }

    async fn release(&mut self) {
        match self {
            Either::Left(l) => l.release().await,
            Either::Right(r) => r.release().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;

    use super::*;
    use crate::{
        build::{from_iter, FromIter},
        error::Error,
        sequence::Sequence,
        testing::Probe,
    };

    #[tokio::test]
    async fn test_current_is_cleared_by_take() {
        let mut cursor = from_iter(vec!["a"]).enumerator();

        assert_eq!(cursor.advance().await.unwrap(), Outcome::Produced);
        assert_eq!(cursor.current(), Some(&"a"));
        assert_eq!(cursor.take_current(), Some("a"));
        assert_eq!(cursor.current(), None);
    }

    #[tokio::test]
    async fn test_boxed_enumerator_forwards_calls() {
        let mut cursor: BoxEnumerator<u8> = Box::new(from_iter(vec![4u8, 5]).enumerator());

        assert_eq!(cursor.next_item().await.unwrap(), Some(4));
        cursor.release().await;
        assert_eq!(cursor.advance().await.unwrap(), Outcome::Exhausted);
    }

    #[tokio::test]
    async fn test_into_stream_collects_all_items() {
        let items: Vec<i32> = from_iter(vec![1, 2, 3])
            .enumerator()
            .into_stream()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(items, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_into_stream_stops_after_first_error() {
        let probe = Probe::new(vec![1, 2, 3]).failing_at(1);
        let stats = probe.stats();
        let results: Vec<Result<i32>> = probe.enumerator().into_stream().collect().await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().ok(), Some(&1));
        assert!(matches!(results[1], Err(Error::Failed(_))));
        assert_eq!(stats.released(), 1);
    }

    #[tokio::test]
    async fn test_either_dispatches_to_active_side() {
        type Cursor = <FromIter<Vec<i32>> as Sequence>::Enumerator;

        let mut left: Either<Cursor, Cursor> = Either::Left(from_iter(vec![1]).enumerator());
        let mut right: Either<Cursor, Cursor> = Either::Right(from_iter(vec![2]).enumerator());

        assert_eq!(left.next_item().await.unwrap(), Some(1));
        assert_eq!(right.next_item().await.unwrap(), Some(2));
    }
}
