//! Running folds.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    cancel::CancellationToken,
    enumerator::Enumerator,
    error::Result,
    func::Accumulate,
    iter::{AsyncIter, IterLogic},
    sequence::Sequence,
};

/// Where the accumulator of a [`Scan`] starts.
pub enum Seed<T, A> {
    /// Start from this value; every item is folded in and emitted.
    Value(A),
    /// The first item, converted, becomes the accumulator and is not emitted.
    FirstElement(fn(T) -> A),
}

impl<T> Seed<T, T> {
    /// The unseeded form: the first item is the starting accumulator.
    pub fn first_element() -> Self {
        Seed::FirstElement(|item| item)
    }
}

impl<T, A: Clone> Clone for Seed<T, A> {
    fn clone(&self) -> Self {
        match self {
            Seed::Value(seed) => Seed::Value(seed.clone()),
            Seed::FirstElement(lift) => Seed::FirstElement(*lift),
        }
    }
}

/// Emits the accumulator after each fold step.
pub struct Scan<S: Sequence, A, G> {
    source: S,
    seed: Seed<S::Item, A>,
    accumulator: Arc<G>,
}

impl<S: Sequence, A, G> Scan<S, A, G> {
    pub fn new(source: S, seed: Seed<S::Item, A>, accumulator: G) -> Self {
        Self {
            source,
            seed,
            accumulator: Arc::new(accumulator),
        }
    }
}

impl<S: Sequence, A: Clone, G> Clone for Scan<S, A, G> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            seed: self.seed.clone(),
            accumulator: Arc::clone(&self.accumulator),
        }
    }
}

impl<S, A, G> Sequence for Scan<S, A, G>
where
    S: Sequence,
    A: Clone + Send + Sync + 'static,
    G: Accumulate<A, S::Item>,
{
    type Item = A;
    type Enumerator = AsyncIter<ScanLogic<S, A, G>>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        AsyncIter::new(ScanLogic::new(self.clone()), cancel)
    }

    fn count_hint(&self) -> Option<usize> {
        let n = self.source.count_hint()?;
        Some(match self.seed {
            Seed::Value(_) => n,
            Seed::FirstElement(_) => n.saturating_sub(1),
        })
    }
}

pub struct ScanLogic<S: Sequence, A, G> {
    op: Scan<S, A, G>,
    source: Option<S::Enumerator>,
    acc: Option<A>,
}

impl<S: Sequence, A, G> ScanLogic<S, A, G> {
    fn new(op: Scan<S, A, G>) -> Self {
        Self {
            op,
            source: None,
            acc: None,
        }
    }
}

#[async_trait]
impl<S, A, G> IterLogic for ScanLogic<S, A, G>
where
    S: Sequence,
    A: Clone + Send + Sync + 'static,
    G: Accumulate<A, S::Item>,
{
    type Item = A;
    const NAME: &'static str = "scan";

    fn acquire(&mut self, cancel: &CancellationToken) -> Result<()> {
        self.source = Some(self.op.source.enumerate(cancel.clone()));
        Ok(())
    }

    async fn step(&mut self, cancel: &CancellationToken) -> Result<Option<A>> {
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };
        while let Some(item) = source.next_item().await? {
            let acc = match self.acc.take() {
                Some(acc) => acc,
                None => match &self.op.seed {
                    Seed::Value(seed) => seed.clone(),
                    Seed::FirstElement(lift) => {
                        self.acc = Some(lift(item));
                        continue;
                    }
                },
            };
            let next = self.op.accumulator.accumulate(acc, item, cancel).await?;
            self.acc = Some(next.clone());
            return Ok(Some(next));
        }
        Ok(None)
    }

    async fn release(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release().await;
        }
        self.acc = None;
    }

    fn fresh(&self) -> Self {
        Self::new(self.op.clone())
    }
}
