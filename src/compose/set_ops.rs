//! Set operators driven by an [`EqualityComparer`].
//!
//! Both operators drain the second sequence into a [`ComparerSet`] and release it before the
//! first sequence is acquired. The first sequence is then streamed and filtered against the
//! set, so results keep the first sequence's order and contain no duplicates.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::{
    cancel::CancellationToken,
    comparer::EqualityComparer,
    enumerator::Enumerator,
    error::Result,
    iter::{AsyncIter, IterLogic},
    sequence::Sequence,
    set::ComparerSet,
};

/// Pulls every item of `slot` into a new set and releases it.
async fn drain_into_set<E, C>(
    operator: &'static str,
    slot: &mut Option<E>,
    comparer: Arc<C>,
) -> Result<ComparerSet<E::Item, Arc<C>>>
where
    E: Enumerator,
    C: EqualityComparer<E::Item>,
{
    let mut set = ComparerSet::new(comparer);
    if let Some(second) = slot.as_mut() {
        while let Some(item) = second.next_item().await? {
            set.insert(item);
        }
    }
    // released in place so a cancelled step leaves it for the logic's release
    if let Some(second) = slot.as_mut() {
        second.release().await;
    }
    *slot = None;
    trace!(operator, distinct = set.len(), "second sequence drained");
    Ok(set)
}

/// Distinct items of the first sequence that also occur in the second.
///
/// ```rust
/// use lazyseq::prelude::*;
///
/// # futures::executor::block_on(async {
/// let common = from_iter(vec!["a", "a", "b", "c"]).intersect(from_iter(vec!["a", "b", "b"]));
/// assert_eq!(to_vec(&common).await.unwrap(), vec!["a", "b"]);
/// # });
/// ```
pub struct Intersect<S, O, C> {
    first: S,
    second: O,
    comparer: Arc<C>,
}

impl<S, O, C> Intersect<S, O, C> {
    pub fn new(first: S, second: O, comparer: C) -> Self {
        Self {
            first,
            second,
            comparer: Arc::new(comparer),
        }
    }
}

impl<S: Clone, O: Clone, C> Clone for Intersect<S, O, C> {
    fn clone(&self) -> Self {
        Self {
            first: self.first.clone(),
            second: self.second.clone(),
            comparer: Arc::clone(&self.comparer),
        }
    }
}

impl<S, O, C> Sequence for Intersect<S, O, C>
where
    S: Sequence,
    O: Sequence<Item = S::Item>,
    C: EqualityComparer<S::Item>,
{
    type Item = S::Item;
    type Enumerator = AsyncIter<IntersectLogic<S, O, C>>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        AsyncIter::new(IntersectLogic::new(self.clone()), cancel)
    }
}

pub struct IntersectLogic<S: Sequence, O: Sequence, C> {
    op: Intersect<S, O, C>,
    second: Option<O::Enumerator>,
    first: Option<S::Enumerator>,
    set: Option<ComparerSet<S::Item, Arc<C>>>,
}

impl<S: Sequence, O: Sequence, C> IntersectLogic<S, O, C> {
    fn new(op: Intersect<S, O, C>) -> Self {
        Self {
            op,
            second: None,
            first: None,
            set: None,
        }
    }
}

#[async_trait]
impl<S, O, C> IterLogic for IntersectLogic<S, O, C>
where
    S: Sequence,
    O: Sequence<Item = S::Item>,
    C: EqualityComparer<S::Item>,
{
    type Item = S::Item;
    const NAME: &'static str = "intersect";

    fn acquire(&mut self, cancel: &CancellationToken) -> Result<()> {
        self.second = Some(self.op.second.enumerate(cancel.clone()));
        Ok(())
    }

    async fn step(&mut self, cancel: &CancellationToken) -> Result<Option<S::Item>> {
        if self.set.is_none() {
            let comparer = Arc::clone(&self.op.comparer);
            let set = drain_into_set(Self::NAME, &mut self.second, comparer).await?;
            self.set = Some(set);
            self.first = Some(self.op.first.enumerate(cancel.clone()));
        }

        let (Some(first), Some(set)) = (self.first.as_mut(), self.set.as_mut()) else {
            return Ok(None);
        };
        while let Some(item) = first.next_item().await? {
            if set.remove(&item) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    async fn release(&mut self) {
        if let Some(mut second) = self.second.take() {
            second.release().await;
        }
        if let Some(mut first) = self.first.take() {
            first.release().await;
        }
        self.set = None;
    }

    fn fresh(&self) -> Self {
        Self::new(self.op.clone())
    }
}

/// Distinct items of the first sequence that do not occur in the second.
///
/// ```rust
/// use lazyseq::prelude::*;
///
/// # futures::executor::block_on(async {
/// let rest = from_iter(vec![1, 2, 2, 3, 4]).except(from_iter(vec![3, 1]));
/// assert_eq!(to_vec(&rest).await.unwrap(), vec![2, 4]);
/// # });
/// ```
pub struct Except<S, O, C> {
    first: S,
    second: O,
    comparer: Arc<C>,
}

impl<S, O, C> Except<S, O, C> {
    pub fn new(first: S, second: O, comparer: C) -> Self {
        Self {
            first,
            second,
            comparer: Arc::new(comparer),
        }
    }
}

impl<S: Clone, O: Clone, C> Clone for Except<S, O, C> {
    fn clone(&self) -> Self {
        Self {
            first: self.first.clone(),
            second: self.second.clone(),
            comparer: Arc::clone(&self.comparer),
        }
    }
}

impl<S, O, C> Sequence for Except<S, O, C>
where
    S: Sequence,
    S::Item: Clone,
    O: Sequence<Item = S::Item>,
    C: EqualityComparer<S::Item>,
{
    type Item = S::Item;
    type Enumerator = AsyncIter<ExceptLogic<S, O, C>>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        AsyncIter::new(ExceptLogic::new(self.clone()), cancel)
    }
}

pub struct ExceptLogic<S: Sequence, O: Sequence, C> {
    op: Except<S, O, C>,
    second: Option<O::Enumerator>,
    first: Option<S::Enumerator>,
    seen: Option<ComparerSet<S::Item, Arc<C>>>,
}

impl<S: Sequence, O: Sequence, C> ExceptLogic<S, O, C> {
    fn new(op: Except<S, O, C>) -> Self {
        Self {
            op,
            second: None,
            first: None,
            seen: None,
        }
    }
}

#[async_trait]
impl<S, O, C> IterLogic for ExceptLogic<S, O, C>
where
    S: Sequence,
    S::Item: Clone,
    O: Sequence<Item = S::Item>,
    C: EqualityComparer<S::Item>,
{
    type Item = S::Item;
    const NAME: &'static str = "except";

    fn acquire(&mut self, cancel: &CancellationToken) -> Result<()> {
        self.second = Some(self.op.second.enumerate(cancel.clone()));
        Ok(())
    }

    async fn step(&mut self, cancel: &CancellationToken) -> Result<Option<S::Item>> {
        if self.seen.is_none() {
            let comparer = Arc::clone(&self.op.comparer);
            let seen = drain_into_set(Self::NAME, &mut self.second, comparer).await?;
            self.seen = Some(seen);
            self.first = Some(self.op.first.enumerate(cancel.clone()));
        }

        let (Some(first), Some(seen)) = (self.first.as_mut(), self.seen.as_mut()) else {
            return Ok(None);
        };
        while let Some(item) = first.next_item().await? {
            // every emitted item joins the set so later duplicates are dropped
            if seen.insert(item.clone()) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    async fn release(&mut self) {
        if let Some(mut second) = self.second.take() {
            second.release().await;
        }
        if let Some(mut first) = self.first.take() {
            first.release().await;
        }
        self.seen = None;
    }

    fn fresh(&self) -> Self {
        Self::new(self.op.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        build::{empty, from_iter},
        consume::to_vec,
        error::Error,
        outcome::Outcome,
        testing::{Probe, SlowRelease},
    };

    #[tokio::test]
    async fn test_intersect_distinct_in_first_order() {
        let seq = from_iter(vec!['c', 'a', 'a', 'b', 'c']).intersect(from_iter(vec!['a', 'c', 'c']));
        assert_eq!(to_vec(&seq).await.unwrap(), vec!['c', 'a']);
    }

    #[tokio::test]
    async fn test_intersect_with_empty_side() {
        let left = from_iter(vec![1, 2]).intersect(empty());
        assert!(to_vec(&left).await.unwrap().is_empty());

        let right = empty::<i32>().intersect(from_iter(vec![1, 2]));
        assert!(to_vec(&right).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_intersect_by_key() {
        let seq = from_iter(vec!["Apple", "BANANA", "cherry"])
            .intersect_by(from_iter(vec!["banana", "APPLE"]), |s: &&str| s.to_lowercase());
        assert_eq!(to_vec(&seq).await.unwrap(), vec!["Apple", "BANANA"]);
    }

    #[tokio::test]
    async fn test_second_drained_and_released_before_first_acquired() {
        let first = Probe::new(vec![1, 2]);
        let second = Probe::new(vec![2, 3]);
        let (first_stats, second_stats) = (first.stats(), second.stats());
        let mut cursor = first.intersect(second).enumerator();

        assert_eq!(cursor.advance().await.unwrap(), Outcome::Produced);
        assert_eq!(cursor.current(), Some(&2));
        assert_eq!(second_stats.pulled(), 2);
        assert_eq!(second_stats.released(), 1);
        assert_eq!(first_stats.acquired(), 1);

        assert_eq!(cursor.advance().await.unwrap(), Outcome::Exhausted);
        assert_eq!(first_stats.released(), 1);
    }

    #[tokio::test]
    async fn test_second_failure_never_acquires_first() {
        let first = Probe::new(vec![1]);
        let second = Probe::new(vec![1, 2]).failing_at(1);
        let (first_stats, second_stats) = (first.stats(), second.stats());

        let err = to_vec(&first.intersect(second)).await.unwrap_err();
        assert_eq!(err.to_string(), "probe failure at position 1");
        assert_eq!(second_stats.released(), 1);
        assert_eq!(first_stats.acquired(), 0);
    }

    #[tokio::test]
    async fn test_cancel_while_second_releases_still_completes_release() {
        let first = Probe::new(vec![1, 2]);
        let second = SlowRelease::new(vec![2], Duration::from_millis(20));
        let (first_stats, second_stats) = (first.stats(), second.stats());

        let token = CancellationToken::new();
        let mut cursor = first.intersect(second).enumerate(token.clone());

        let trigger = token.clone();
        let (result, ()) = tokio::join!(cursor.advance(), async move {
            tokio::task::yield_now().await;
            trigger.cancel();
        });

        assert!(matches!(result, Err(Error::Cancelled)), "{result:?}");
        assert_eq!(second_stats.pulled(), 1);
        assert_eq!(second_stats.released(), 1);
        assert_eq!(first_stats.acquired(), 0);
        assert_eq!(cursor.advance().await.unwrap(), Outcome::Exhausted);
    }

    #[tokio::test]
    async fn test_except_drops_members_and_duplicates() {
        let seq = from_iter(vec![4, 1, 4, 2, 3, 1]).except(from_iter(vec![3]));
        assert_eq!(to_vec(&seq).await.unwrap(), vec![4, 1, 2]);
    }

    #[tokio::test]
    async fn test_except_with_custom_comparer() {
        let parity = crate::comparer::KeyEq::new(|n: &u32| n % 2);
        let seq = from_iter(vec![1, 2, 3, 4, 5]).except_with(from_iter(vec![7]), parity);
        assert_eq!(to_vec(&seq).await.unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn test_release_before_first_pull_releases_nothing_twice() {
        let first = Probe::new(vec![1]);
        let second = Probe::new(vec![1]);
        let (first_stats, second_stats) = (first.stats(), second.stats());
        let mut cursor = first.except(second).enumerator();

        cursor.release().await;
        assert_eq!(cursor.advance().await.unwrap(), Outcome::Exhausted);
        assert_eq!(first_stats.acquired(), 0);
        assert_eq!(second_stats.acquired(), 0);
    }
}
