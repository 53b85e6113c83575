//! Sources backed by ordinary iterators.

use std::{marker::PhantomData, sync::Arc};

use async_trait::async_trait;

use crate::{
    cancel::CancellationToken,
    error::Result,
    iter::{AsyncIter, IterLogic},
    sequence::Sequence,
    validate,
};

/// Sequence over a cloneable collection or iterator.
#[derive(Debug, Clone)]
pub struct FromIter<I> {
    iter: I,
}

/// Creates a sequence that enumerates a fresh clone of `iter` every time.
///
/// # Examples
///
/// ```rust
/// use lazyseq::prelude::*;
///
/// # futures::executor::block_on(async {
/// let letters = from_iter("abc".chars());
/// assert_eq!(letters.count_hint(), None);
/// assert_eq!(to_vec(&letters).await.unwrap(), vec!['a', 'b', 'c']);
/// # });
/// ```
pub fn from_iter<I>(iter: I) -> FromIter<I>
where
    I: IntoIterator + Clone + Send + Sync + 'static,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    FromIter { iter }
}

impl<I> Sequence for FromIter<I>
where
    I: IntoIterator + Clone + Send + Sync + 'static,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    type Item = I::Item;
    type Enumerator = AsyncIter<FromIterLogic<I>>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        AsyncIter::new(
            FromIterLogic {
                source: self.clone(),
                cursor: None,
            },
            cancel,
        )
    }

    fn count_hint(&self) -> Option<usize> {
        let (low, high) = self.iter.clone().into_iter().size_hint();
        (Some(low) == high).then_some(low)
    }

    fn try_materialize(&self) -> Option<Vec<I::Item>> {
        Some(self.iter.clone().into_iter().collect())
    }
}

pub struct FromIterLogic<I: IntoIterator> {
    source: FromIter<I>,
    cursor: Option<I::IntoIter>,
}

#[async_trait]
impl<I> IterLogic for FromIterLogic<I>
where
    I: IntoIterator + Clone + Send + Sync + 'static,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    type Item = I::Item;
    const NAME: &'static str = "from_iter";

    fn acquire(&mut self, _cancel: &CancellationToken) -> Result<()> {
        self.cursor = Some(self.source.iter.clone().into_iter());
        Ok(())
    }

    async fn step(&mut self, _cancel: &CancellationToken) -> Result<Option<I::Item>> {
        Ok(self.cursor.as_mut().and_then(Iterator::next))
    }

    async fn release(&mut self) {
        self.cursor = None;
    }

    fn fresh(&self) -> Self {
        Self {
            source: self.source.clone(),
            cursor: None,
        }
    }
}

/// Sequence that produces nothing.
pub struct Empty<T> {
    _item: PhantomData<fn() -> T>,
}

/// Creates a sequence that is exhausted immediately.
pub fn empty<T>() -> Empty<T> {
    Empty { _item: PhantomData }
}

impl<T> Clone for Empty<T> {
    fn clone(&self) -> Self {
        empty()
    }
}

impl<T> Copy for Empty<T> {}

impl<T> std::fmt::Debug for Empty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Empty")
    }
}

impl<T: Send + 'static> Sequence for Empty<T> {
    type Item = T;
    type Enumerator = AsyncIter<Empty<T>>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        AsyncIter::new(*self, cancel)
    }

    fn count_hint(&self) -> Option<usize> {
        Some(0)
    }

    fn try_materialize(&self) -> Option<Vec<T>> {
        Some(Vec::new())
    }
}

#[async_trait]
impl<T: Send + 'static> IterLogic for Empty<T> {
    type Item = T;
    const NAME: &'static str = "empty";

    fn acquire(&mut self, _cancel: &CancellationToken) -> Result<()> {
        Ok(())
    }

    async fn step(&mut self, _cancel: &CancellationToken) -> Result<Option<T>> {
        Ok(None)
    }

    async fn release(&mut self) {}

    fn fresh(&self) -> Self {
        *self
    }
}

/// Sequence built by calling a factory at the start of every enumeration.
pub struct Defer<F> {
    factory: Arc<F>,
}

/// Creates a sequence whose items come from `factory()`, called once per enumeration.
///
/// Unlike [`from_iter`], the produced items need not be cloneable.
pub fn defer<F, I>(factory: F) -> Defer<F>
where
    F: Fn() -> I + Send + Sync + 'static,
    I: IntoIterator + 'static,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    Defer {
        factory: Arc::new(factory),
    }
}

impl<F> Clone for Defer<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<F, I> Sequence for Defer<F>
where
    F: Fn() -> I + Send + Sync + 'static,
    I: IntoIterator + 'static,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    type Item = I::Item;
    type Enumerator = AsyncIter<DeferLogic<F, I>>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        AsyncIter::new(
            DeferLogic {
                source: self.clone(),
                cursor: None,
            },
            cancel,
        )
    }
}

pub struct DeferLogic<F, I: IntoIterator> {
    source: Defer<F>,
    cursor: Option<I::IntoIter>,
}

#[async_trait]
impl<F, I> IterLogic for DeferLogic<F, I>
where
    F: Fn() -> I + Send + Sync + 'static,
    I: IntoIterator + 'static,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    type Item = I::Item;
    const NAME: &'static str = "defer";

    fn acquire(&mut self, _cancel: &CancellationToken) -> Result<()> {
        self.cursor = Some((self.source.factory)().into_iter());
        Ok(())
    }

    async fn step(&mut self, _cancel: &CancellationToken) -> Result<Option<I::Item>> {
        Ok(self.cursor.as_mut().and_then(Iterator::next))
    }

    async fn release(&mut self) {
        self.cursor = None;
    }

    fn fresh(&self) -> Self {
        Self {
            source: self.source.clone(),
            cursor: None,
        }
    }
}

/// Sequence of `count` clones of one item.
#[derive(Debug, Clone)]
pub struct Repeat<T> {
    item: T,
    count: usize,
}

/// Creates a sequence that yields `item` `count` times.
///
/// Fails with [`Error::InvalidArgument`](crate::Error::InvalidArgument) if `count` is negative.
///
/// ```rust
/// use lazyseq::prelude::*;
///
/// # futures::executor::block_on(async {
/// let seq = repeat("hi", 2).unwrap();
/// assert_eq!(to_vec(&seq).await.unwrap(), vec!["hi", "hi"]);
/// assert!(repeat("hi", -1).is_err());
/// # });
/// ```
pub fn repeat<T>(item: T, count: i64) -> Result<Repeat<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let count = validate::non_negative("count", count)?;
    Ok(Repeat { item, count })
}

impl<T> Sequence for Repeat<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;
    type Enumerator = AsyncIter<RepeatLogic<T>>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        AsyncIter::new(
            RepeatLogic {
                source: self.clone(),
                remaining: 0,
            },
            cancel,
        )
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.count)
    }
}

pub struct RepeatLogic<T> {
    source: Repeat<T>,
    remaining: usize,
}

#[async_trait]
impl<T> IterLogic for RepeatLogic<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;
    const NAME: &'static str = "repeat";

    fn acquire(&mut self, _cancel: &CancellationToken) -> Result<()> {
        self.remaining = self.source.count;
        Ok(())
    }

    async fn step(&mut self, _cancel: &CancellationToken) -> Result<Option<T>> {
        let Some(remaining) = self.remaining.checked_sub(1) else {
            return Ok(None);
        };
        self.remaining = remaining;
        Ok(Some(self.source.item.clone()))
    }

    async fn release(&mut self) {
        self.remaining = 0;
    }

    fn fresh(&self) -> Self {
        Self {
            source: self.source.clone(),
            remaining: 0,
        }
    }
}
