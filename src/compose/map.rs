//! Element-wise projection.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    cancel::CancellationToken,
    enumerator::Enumerator,
    error::Result,
    iter::{AsyncIter, IterLogic},
    sequence::Sequence,
};

/// Applies a synchronous function to every item.
///
/// ```rust
/// use lazyseq::prelude::*;
///
/// # futures::executor::block_on(async {
/// let doubled = from_iter(vec![1, 2, 3]).map(|x| x * 2);
/// assert_eq!(doubled.count_hint(), Some(3));
/// assert_eq!(to_vec(&doubled).await.unwrap(), vec![2, 4, 6]);
/// # });
/// ```
pub struct Map<S, F> {
    source: S,
    f: Arc<F>,
}

impl<S, F> Map<S, F> {
    pub fn new(source: S, f: F) -> Self {
        Self {
            source,
            f: Arc::new(f),
        }
    }
}

impl<S: Clone, F> Clone for Map<S, F> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            f: Arc::clone(&self.f),
        }
    }
}

impl<S, F, U> Sequence for Map<S, F>
where
    S: Sequence,
    F: Fn(S::Item) -> U + Send + Sync + 'static,
    U: Send + 'static,
{
    type Item = U;
    type Enumerator = AsyncIter<MapLogic<S, F>>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        AsyncIter::new(
            MapLogic {
                op: self.clone(),
                source: None,
            },
            cancel,
        )
    }

    fn count_hint(&self) -> Option<usize> {
        self.source.count_hint()
    }

    fn try_materialize(&self) -> Option<Vec<U>> {
        let items = self.source.try_materialize()?;
        Some(items.into_iter().map(|item| (self.f)(item)).collect())
    }
}

pub struct MapLogic<S: Sequence, F> {
    op: Map<S, F>,
    source: Option<S::Enumerator>,
}

#[async_trait]
impl<S, F, U> IterLogic for MapLogic<S, F>
where
    S: Sequence,
    F: Fn(S::Item) -> U + Send + Sync + 'static,
    U: Send + 'static,
{
    type Item = U;
    const NAME: &'static str = "map";

    fn acquire(&mut self, cancel: &CancellationToken) -> Result<()> {
        self.source = Some(self.op.source.enumerate(cancel.clone()));
        Ok(())
    }

    async fn step(&mut self, _cancel: &CancellationToken) -> Result<Option<U>> {
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };
        let item = source.next_item().await?;
        Ok(item.map(|item| (self.op.f)(item)))
    }

    async fn release(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release().await;
        }
    }

    fn fresh(&self) -> Self {
        Self {
            op: self.op.clone(),
            source: None,
        }
    }
}
