use std::{any::Any, marker::PhantomData, sync::Arc};

use async_trait::async_trait;

use crate::{
    cancel::CancellationToken,
    enumerator::Enumerator,
    error::Result,
    iter::{AsyncIter, IterLogic},
    sequence::Sequence,
};

/// Runtime type test and conversion used by [`OfType`].
pub trait Downcast<U>: Sized {
    /// Returns the value as a `U`, or `None` if it is some other kind.
    fn downcast(self) -> Option<U>;
}

impl<U: Any> Downcast<U> for Box<dyn Any + Send> {
    fn downcast(self) -> Option<U> {
        <Box<dyn Any + Send>>::downcast::<U>(self).ok().map(|value| *value)
    }
}

impl<U: Any> Downcast<U> for Box<dyn Any + Send + Sync> {
    fn downcast(self) -> Option<U> {
        <Box<dyn Any + Send + Sync>>::downcast::<U>(self)
            .ok()
            .map(|value| *value)
    }
}

impl<U> Downcast<Arc<U>> for Arc<dyn Any + Send + Sync>
where
    U: Any + Send + Sync,
{
    fn downcast(self) -> Option<Arc<U>> {
        <Arc<dyn Any + Send + Sync>>::downcast::<U>(self).ok()
    }
}

/// Absent values are of no type.
impl<U> Downcast<U> for Option<U> {
    fn downcast(self) -> Option<U> {
        self
    }
}

/// Keeps the items that are of kind `U`, in order.
pub struct OfType<S, U> {
    source: S,
    _kind: PhantomData<fn() -> U>,
}

impl<S, U> OfType<S, U> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            _kind: PhantomData,
        }
    }
}

impl<S: Clone, U> Clone for OfType<S, U> {
    fn clone(&self) -> Self {
        Self::new(self.source.clone())
    }
}

impl<S, U> Sequence for OfType<S, U>
where
    S: Sequence,
    S::Item: Downcast<U>,
    U: Send + 'static,
{
    type Item = U;
    type Enumerator = AsyncIter<OfTypeLogic<S, U>>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        AsyncIter::new(
            OfTypeLogic {
                op: self.clone(),
                source: None,
            },
            cancel,
        )
    }
}

pub struct OfTypeLogic<S: Sequence, U> {
    op: OfType<S, U>,
    source: Option<S::Enumerator>,
}

#[async_trait]
impl<S, U> IterLogic for OfTypeLogic<S, U>
where
    S: Sequence,
    S::Item: Downcast<U>,
    U: Send + 'static,
{
    type Item = U;
    const NAME: &'static str = "of_type";

    fn acquire(&mut self, cancel: &CancellationToken) -> Result<()> {
        self.source = Some(self.op.source.enumerate(cancel.clone()));
        Ok(())
    }

    async fn step(&mut self, _cancel: &CancellationToken) -> Result<Option<U>> {
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };
        while let Some(item) = source.next_item().await? {
            if let Some(value) = Downcast::<U>::downcast(item) {
                return Ok(Some(value));
            }
        }
        Ok(None)
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
