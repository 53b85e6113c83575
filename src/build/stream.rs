//! Sources backed by [`futures::Stream`]s.
//!
//! A stream can only be walked once, so these sources take a factory and open a new stream
//! for every enumeration. Releasing the enumerator drops the stream.

use std::{pin::Pin, sync::Arc};

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use crate::{
    cancel::CancellationToken,
    error::Result,
    iter::{AsyncIter, IterLogic},
    sequence::Sequence,
};

/// Sequence over streams opened by a factory.
pub struct FromStream<F> {
    factory: Arc<F>,
}

/// Creates a sequence that opens `factory()` at the start of every enumeration.
///
/// ```rust
/// use lazyseq::prelude::*;
///
/// # futures::executor::block_on(async {
/// let seq = from_stream(|| futures::stream::iter(vec![3, 4]));
/// assert_eq!(to_vec(&seq).await.unwrap(), vec![3, 4]);
/// # });
/// ```
pub fn from_stream<F, St>(factory: F) -> FromStream<F>
where
    F: Fn() -> St + Send + Sync + 'static,
    St: Stream + Send + 'static,
    St::Item: Send + 'static,
{
    FromStream {
        factory: Arc::new(factory),
    }
}

impl<F> Clone for FromStream<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<F, St> Sequence for FromStream<F>
where
    F: Fn() -> St + Send + Sync + 'static,
    St: Stream + Send + 'static,
    St::Item: Send + 'static,
{
    type Item = St::Item;
    type Enumerator = AsyncIter<StreamLogic<F, St>>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        AsyncIter::new(StreamLogic::new(Arc::clone(&self.factory)), cancel)
    }
}

/// Sequence over fallible streams opened by a factory.
///
/// An `Err` item fails the enumeration with that error, verbatim.
pub struct TryFromStream<F> {
    factory: Arc<F>,
}

/// Creates a sequence over a stream of `Result`s.
///
/// ```rust
/// use lazyseq::prelude::*;
///
/// # futures::executor::block_on(async {
/// let seq = try_from_stream(|| {
///     futures::stream::iter(vec![Ok(1), Err(Error::failed("disk gone")), Ok(2)])
/// });
/// assert_eq!(to_vec(&seq).await.unwrap_err().to_string(), "disk gone");
/// # });
/// ```
pub fn try_from_stream<F, St, T>(factory: F) -> TryFromStream<F>
where
    F: Fn() -> St + Send + Sync + 'static,
    St: Stream<Item = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    TryFromStream {
        factory: Arc::new(factory),
    }
}

impl<F> Clone for TryFromStream<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<F, St, T> Sequence for TryFromStream<F>
where
    F: Fn() -> St + Send + Sync + 'static,
    St: Stream<Item = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    type Item = T;
    type Enumerator = AsyncIter<TryStreamLogic<F, St>>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        AsyncIter::new(
            TryStreamLogic(StreamLogic::new(Arc::clone(&self.factory))),
            cancel,
        )
    }
}

pub struct StreamLogic<F, St> {
    factory: Arc<F>,
    stream: Option<Pin<Box<St>>>,
}

impl<F, St> StreamLogic<F, St>
where
    F: Fn() -> St,
{
    fn new(factory: Arc<F>) -> Self {
        Self {
            factory,
            stream: None,
        }
    }

    fn open(&mut self) {
        self.stream = Some(Box::pin((self.factory)()));
    }
}

#[async_trait]
impl<F, St> IterLogic for StreamLogic<F, St>
where
    F: Fn() -> St + Send + Sync + 'static,
    St: Stream + Send + 'static,
    St::Item: Send + 'static,
{
    type Item = St::Item;
    const NAME: &'static str = "from_stream";

    fn acquire(&mut self, _cancel: &CancellationToken) -> Result<()> {
        self.open();
        Ok(())
    }

    async fn step(&mut self, _cancel: &CancellationToken) -> Result<Option<St::Item>> {
        match self.stream.as_mut() {
            Some(stream) => Ok(stream.next().await),
            None => Ok(None),
        }
    }

    async fn release(&mut self) {
        self.stream = None;
    }

    fn fresh(&self) -> Self {
        Self::new(Arc::clone(&self.factory))
    }
}

pub struct TryStreamLogic<F, St>(StreamLogic<F, St>);

#[async_trait]
impl<F, St, T> IterLogic for TryStreamLogic<F, St>
where
    F: Fn() -> St + Send + Sync + 'static,
    St: Stream<Item = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    type Item = T;
    const NAME: &'static str = "try_from_stream";

    fn acquire(&mut self, _cancel: &CancellationToken) -> Result<()> {
        self.0.open();
        Ok(())
    }

    async fn step(&mut self, _cancel: &CancellationToken) -> Result<Option<T>> {
        let Some(stream) = self.0.stream.as_mut() else {
            return Ok(None);
        };
        stream.next().await.transpose()
    }

    async fn release(&mut self) {
        self.0.stream = None;
    }

    fn fresh(&self) -> Self {
        TryStreamLogic(StreamLogic::new(Arc::clone(&self.0.factory)))
    }
}
