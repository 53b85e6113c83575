use std::collections::VecDeque;

use async_trait::async_trait;

use crate::{
    cancel::CancellationToken,
    enumerator::Enumerator,
    error::Result,
    iter::{AsyncIter, IterLogic},
    sequence::Sequence,
};

/// Withholds the final `count` items of the source.
///
/// Items are delayed through a window of `count` slots: an item is emitted only once
/// `count` newer items have been seen, so at most `count` items are buffered at any time.
///
/// ```rust
/// use lazyseq::prelude::*;
///
/// # futures::executor::block_on(async {
/// let head = from_iter(vec![1, 2, 3, 4, 5]).skip_last(2);
/// assert_eq!(to_vec(&head).await.unwrap(), vec![1, 2, 3]);
/// # });
/// ```
#[derive(Clone)]
pub struct SkipLast<S> {
    source: S,
    count: usize,
}

impl<S> SkipLast<S> {
    pub fn new(source: S, count: usize) -> Self {
        Self { source, count }
    }
}

impl<S> Sequence for SkipLast<S>
where
    S: Sequence,
{
    type Item = S::Item;
    type Enumerator = AsyncIter<SkipLastLogic<S>>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        AsyncIter::new(SkipLastLogic::new(self.clone()), cancel)
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.source.count_hint()?.saturating_sub(self.count))
    }
}

pub struct SkipLastLogic<S: Sequence> {
    op: SkipLast<S>,
    source: Option<S::Enumerator>,
    // None when count is zero
    window: Option<VecDeque<S::Item>>,
}

impl<S: Sequence> SkipLastLogic<S> {
    fn new(op: SkipLast<S>) -> Self {
        Self {
            op,
            source: None,
            window: None,
        }
    }
}

#[async_trait]
impl<S> IterLogic for SkipLastLogic<S>
where
    S: Sequence,
{
    type Item = S::Item;
    const NAME: &'static str = "skip_last";

    fn acquire(&mut self, cancel: &CancellationToken) -> Result<()> {
        self.source = Some(self.op.source.enumerate(cancel.clone()));
        self.window = (self.op.count > 0).then(VecDeque::new);
        Ok(())
    }

    async fn step(&mut self, _cancel: &CancellationToken) -> Result<Option<S::Item>> {
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };
        while let Some(item) = source.next_item().await? {
            let Some(window) = self.window.as_mut() else {
                return Ok(Some(item));
            };
            window.push_back(item);
            if window.len() > self.op.count {
                return Ok(window.pop_front());
            }
        }
        Ok(None)
    }

    async fn release(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release().await;
        }
        // withheld items are dropped here
        self.window = None;
    }

    fn fresh(&self) -> Self {
        Self::new(self.op.clone())
    }
}
