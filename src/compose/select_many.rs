use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::{
    cancel::CancellationToken,
    enumerator::Enumerator,
    error::{Error, Result},
    func::{Combine, Project},
    iter::{AsyncIter, IterLogic},
    sequence::Sequence,
};

type InnerSeq<S, P> = <P as Project<<S as Sequence>::Item>>::Inner;
type InnerItem<S, P> = <InnerSeq<S, P> as Sequence>::Item;
type InnerCursor<S, P> = <InnerSeq<S, P> as Sequence>::Enumerator;

/// Flattening operator: each outer item is projected to an inner sequence which is drained
/// before the next outer item is pulled.
///
/// Every `select_many*` method builds this type; the variants differ only in the
/// [`Project`] and [`Combine`] adapters they plug in.
pub struct SelectMany<S, P, C> {
    source: S,
    project: Arc<P>,
    combine: Arc<C>,
}

impl<S, P, C> SelectMany<S, P, C> {
    pub fn new(source: S, project: P, combine: C) -> Self {
        Self {
            source,
            project: Arc::new(project),
            combine: Arc::new(combine),
        }
    }
}

impl<S: Clone, P, C> Clone for SelectMany<S, P, C> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            project: Arc::clone(&self.project),
            combine: Arc::clone(&self.combine),
        }
    }
}

impl<S, P, C> Sequence for SelectMany<S, P, C>
where
    S: Sequence,
    P: Project<S::Item>,
    C: Combine<S::Item, InnerItem<S, P>>,
{
    type Item = C::Output;
    type Enumerator = AsyncIter<SelectManyLogic<S, P, C>>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        AsyncIter::new(SelectManyLogic::new(self.clone(), 0), cancel)
    }
}

/// Which upstream a [`SelectManyLogic`] is currently pulling from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Pulling the next outer item and projecting it
    DrawingFromOuter,
    /// Pulling items from the current inner sequence
    DrainingInner,
}

/// Stage logic behind [`SelectMany`].
pub struct SelectManyLogic<S, P, C>
where
    S: Sequence,
    P: Project<S::Item>,
    C: Combine<S::Item, InnerItem<S, P>>,
{
    op: SelectMany<S, P, C>,
    stage: Stage,
    outer: Option<S::Enumerator>,
    inner: Option<(C::Retained, InnerCursor<S, P>)>,
    next_index: Option<usize>,
    first_index: usize,
}

impl<S, P, C> SelectManyLogic<S, P, C>
where
    S: Sequence,
    P: Project<S::Item>,
    C: Combine<S::Item, InnerItem<S, P>>,
{
    fn new(op: SelectMany<S, P, C>, first_index: usize) -> Self {
        Self {
            op,
            stage: Stage::DrawingFromOuter,
            outer: None,
            inner: None,
            next_index: Some(first_index),
            first_index,
        }
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Releases the inner cursor in place and only then empties the slot, so a step
    /// cancelled mid-release leaves the cursor for [`IterLogic::release`] to finish.
    async fn release_inner(&mut self) {
        if let Some((_, cursor)) = self.inner.as_mut() {
            cursor.release().await;
        }
        self.inner = None;
    }
}

#[async_trait]
impl<S, P, C> IterLogic for SelectManyLogic<S, P, C>
where
    S: Sequence,
    P: Project<S::Item>,
    C: Combine<S::Item, InnerItem<S, P>>,
{
    type Item = C::Output;
    const NAME: &'static str = "select_many";

    fn acquire(&mut self, cancel: &CancellationToken) -> Result<()> {
        self.outer = Some(self.op.source.enumerate(cancel.clone()));
        self.stage = Stage::DrawingFromOuter;
        Ok(())
    }

    async fn step(&mut self, cancel: &CancellationToken) -> Result<Option<C::Output>> {
        loop {
            match self.stage {
                Stage::DrawingFromOuter => {
                    let Some(outer) = self.outer.as_mut() else {
                        return Ok(None);
                    };
                    let Some(item) = outer.next_item().await? else {
                        return Ok(None);
                    };

                    let index = self.next_index.ok_or(Error::Overflow {
                        operator: Self::NAME,
                    })?;
                    self.next_index = index.checked_add(1);

                    let retained = self.op.combine.retain(&item);
                    let inner = self.op.project.project(item, index, cancel).await?;
                    self.inner = Some((retained, inner.enumerate(cancel.clone())));
                    self.stage = Stage::DrainingInner;
                    trace!(operator = Self::NAME, index, "draining inner sequence");
                }
                Stage::DrainingInner => {
                    let Some((retained, cursor)) = self.inner.as_mut() else {
                        self.stage = Stage::DrawingFromOuter;
                        continue;
                    };
                    if let Some(value) = cursor.next_item().await? {
                        let produced = self.op.combine.combine(retained, value, cancel).await?;
                        return Ok(Some(produced));
                    }
                    self.release_inner().await;
                    self.stage = Stage::DrawingFromOuter;
                }
            }
        }
    }

    async fn release(&mut self) {
        self.release_inner().await;
        if let Some(mut outer) = self.outer.take() {
            outer.release().await;
        }
        self.stage = Stage::DrawingFromOuter;
    }

    fn fresh(&self) -> Self {
        Self::new(self.op.clone(), self.first_index)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
        time::Duration,
    };

    use super::*;
    use crate::{
        build::{empty, from_iter},
        consume::to_vec,
        func::{ProjectIndexed, TakeInner},
        iter::Lifecycle,
        outcome::Outcome,
        testing::{Probe, SlowRelease},
    };

    #[tokio::test]
    async fn test_outer_then_inner_order() {
        let seq = from_iter(vec![1, 2]).select_many(|i| from_iter(vec![i, i * 10]));
        assert_eq!(to_vec(&seq).await.unwrap(), vec![1, 10, 2, 20]);
    }

    #[tokio::test]
    async fn test_empty_inner_sequences_are_skipped() {
        let seq = from_iter(vec![0, 2, 0, 1]).select_many(|n| from_iter(vec![n; n]));
        assert_eq!(to_vec(&seq).await.unwrap(), vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_empty_outer_produces_nothing() {
        let seq = empty::<u8>().select_many(|n| from_iter(vec![n]));
        assert!(to_vec(&seq).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_previous_inner_released_before_next_acquired() {
        let inner = Probe::new(vec!['x']);
        let stats = inner.stats();
        let observed = Arc::new(Mutex::new(Vec::new()));

        let seq = from_iter(vec![1, 2, 3]).select_many({
            let inner = inner.clone();
            let stats = Arc::clone(&stats);
            let observed = Arc::clone(&observed);
            move |_| {
                observed
                    .lock()
                    .unwrap()
                    .push((stats.acquired(), stats.released()));
                inner.clone()
            }
        });

        assert_eq!(to_vec(&seq).await.unwrap(), vec!['x', 'x', 'x']);
        assert_eq!(*observed.lock().unwrap(), vec![(0, 0), (1, 1), (2, 2)]);
        assert_eq!(stats.acquired(), 3);
        assert_eq!(stats.released(), 3);
    }

    #[tokio::test]
    async fn test_index_increments_once_per_outer_item() {
        let seq = from_iter(vec!['a', 'b', 'c'])
            .select_many_indexed(|c, i| from_iter(vec![format!("{c}{i}"); i]));
        assert_eq!(to_vec(&seq).await.unwrap(), vec!["b1", "c2", "c2"]);
    }

    #[tokio::test]
    async fn test_index_overflow_is_reported() {
        let op = SelectMany::new(
            from_iter(vec![1, 2, 3]),
            ProjectIndexed(|n: i32, _: usize| from_iter(vec![n])),
            TakeInner,
        );
        let mut cursor = AsyncIter::new(
            SelectManyLogic::new(op, usize::MAX),
            CancellationToken::new(),
        );

        assert_eq!(cursor.next_item().await.unwrap(), Some(1));
        let err = cursor.advance().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Overflow {
                operator: "select_many"
            }
        ));
        assert_eq!(cursor.lifecycle(), Lifecycle::Released);
    }

    #[tokio::test]
    async fn test_async_projection_is_awaited() {
        let seq = from_iter(vec![3, 1]).select_many_async(|n| async move {
            tokio::task::yield_now().await;
            Ok(from_iter(0..n))
        });
        assert_eq!(to_vec(&seq).await.unwrap(), vec![0, 1, 2, 0]);
    }

    #[tokio::test]
    async fn test_projection_error_releases_outer_and_inner() {
        let outer = Probe::new(vec![1, 2]);
        let inner = Probe::new(vec![7]);
        let (outer_stats, inner_stats) = (outer.stats(), inner.stats());

        let seq = outer.select_many_async(move |n| {
            let inner = inner.clone();
            async move {
                if n == 2 {
                    Err(Error::failed("projection failed"))
                } else {
                    Ok(inner)
                }
            }
        });
        let mut cursor = seq.enumerator();

        assert_eq!(cursor.next_item().await.unwrap(), Some(7));
        let err = cursor.advance().await.unwrap_err();

        assert_eq!(err.to_string(), "projection failed");
        assert_eq!(outer_stats.released(), 1);
        assert_eq!(inner_stats.released(), 1);
        assert_eq!(cursor.advance().await.unwrap(), Outcome::Exhausted);
    }

    #[tokio::test]
    async fn test_inner_error_propagates_verbatim() {
        let inner = Probe::new(vec![1, 2]).failing_at(1);
        let inner_stats = inner.stats();
        let outer = Probe::new(vec![()]);
        let outer_stats = outer.stats();

        let seq = outer.select_many(move |_| inner.clone());
        let mut cursor = seq.enumerator();

        assert_eq!(cursor.next_item().await.unwrap(), Some(1));
        let err = cursor.advance().await.unwrap_err();
        assert_eq!(err.to_string(), "probe failure at position 1");
        assert_eq!(inner_stats.released(), 1);
        assert_eq!(outer_stats.released(), 1);
    }

    #[tokio::test]
    async fn test_cancel_during_suspended_inner_pull_releases_both_once() {
        let outer = Probe::new(vec![1, 2]);
        let inner = Probe::new(vec![10, 20]).hanging_at(1);
        let (outer_stats, inner_stats) = (outer.stats(), inner.stats());

        let seq = outer.select_many(move |_| inner.clone());
        let token = CancellationToken::new();
        let mut cursor = seq.enumerate(token.clone());

        assert_eq!(cursor.next_item().await.unwrap(), Some(10));

        let trigger = token.clone();
        let (result, ()) = tokio::join!(cursor.advance(), async move {
            tokio::task::yield_now().await;
            trigger.cancel();
        });

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(outer_stats.released(), 1);
        assert_eq!(inner_stats.released(), 1);

        assert_eq!(cursor.advance().await.unwrap(), Outcome::Exhausted);
        drop(cursor);
        assert_eq!(outer_stats.released(), 1);
        assert_eq!(inner_stats.released(), 1);
    }

    #[tokio::test]
    async fn test_cancel_while_inner_releases_still_completes_release() {
        let inner = SlowRelease::new(vec![7], Duration::from_millis(20));
        let stats = inner.stats();

        let seq = from_iter(vec![1, 2]).select_many(move |_| inner.clone());
        let token = CancellationToken::new();
        let mut cursor = seq.enumerate(token.clone());

        assert_eq!(cursor.next_item().await.unwrap(), Some(7));

        // the next advance drains the inner and suspends in its release
        let trigger = token.clone();
        let (result, ()) = tokio::join!(cursor.advance(), async move {
            tokio::task::yield_now().await;
            trigger.cancel();
        });

        assert!(matches!(result, Err(Error::Cancelled)), "{result:?}");
        assert_eq!(stats.acquired(), 1);
        assert_eq!(stats.released(), 1);
        assert_eq!(cursor.advance().await.unwrap(), Outcome::Exhausted);
    }

    #[tokio::test]
    async fn test_cancellation_aware_projection_sees_token() {
        let seen = Arc::new(AtomicUsize::new(0));
        let token = CancellationToken::new();

        let seq = from_iter(vec![1, 2]).select_many_with_cancel({
            let seen = Arc::clone(&seen);
            move |n, cancel: CancellationToken| {
                let seen = Arc::clone(&seen);
                async move {
                    if !cancel.is_cancelled() {
                        seen.fetch_add(1, Ordering::SeqCst);
                    }
                    Ok(from_iter(vec![n]))
                }
            }
        });

        let items = crate::consume::to_vec_with(&seq, token).await.unwrap();
        assert_eq!(items, vec![1, 2]);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_result_selector_sees_outer_item() {
        let seq = from_iter(vec![("a", 2), ("b", 1)])
            .select_many_with(|(_, n)| from_iter(0..n), |(name, _), i| format!("{name}{i}"));
        assert_eq!(to_vec(&seq).await.unwrap(), vec!["a0", "a1", "b0"]);
    }

    #[tokio::test]
    async fn test_async_result_selector() {
        let seq = from_iter(vec![10, 20]).select_many_with_async(
            |_| async { Ok(from_iter(vec![1, 2])) },
            |outer, inner| async move { Ok(outer + inner) },
        );
        assert_eq!(to_vec(&seq).await.unwrap(), vec![11, 12, 21, 22]);
    }

    #[tokio::test]
    async fn test_release_mid_inner_then_advance_is_exhausted() {
        let outer = Probe::new(vec![1, 2]);
        let inner = Probe::new(vec![5, 6]);
        let (outer_stats, inner_stats) = (outer.stats(), inner.stats());
        let mut cursor = outer.select_many(move |_| inner.clone()).enumerator();

        assert_eq!(cursor.next_item().await.unwrap(), Some(5));
        cursor.release().await;
        cursor.release().await;

        assert_eq!(cursor.advance().await.unwrap(), Outcome::Exhausted);
        assert_eq!(outer_stats.released(), 1);
        assert_eq!(inner_stats.released(), 1);
    }

    #[tokio::test]
    async fn test_stage_tracks_which_upstream_is_pulled() {
        let op = SelectMany::new(
            from_iter(vec![1]),
            crate::func::ProjectFn(|n: i32| from_iter(vec![n, n])),
            TakeInner,
        );
        let mut logic = SelectManyLogic::new(op, 0);
        let token = CancellationToken::new();

        assert_eq!(logic.stage(), Stage::DrawingFromOuter);
        logic.acquire(&token).unwrap();
        assert_eq!(logic.step(&token).await.unwrap(), Some(1));
        assert_eq!(logic.stage(), Stage::DrainingInner);
        assert_eq!(logic.step(&token).await.unwrap(), Some(1));
        assert_eq!(logic.step(&token).await.unwrap(), None);
        assert_eq!(logic.stage(), Stage::DrawingFromOuter);
        logic.release().await;
    }
}
