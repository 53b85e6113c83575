//! Restartable descriptions of asynchronous enumerations.
//!
//! A [`Sequence`] holds no mutable state. Each [`enumerate`](Sequence::enumerate) call builds
//! an independent [`Enumerator`]; two enumerations of the same sequence never share a cursor.
//! Operators are provided methods on the trait, so pipelines read left to right:
//!
//! ```rust
//! use lazyseq::prelude::*;
//!
//! # futures::executor::block_on(async {
//! let running_totals = from_iter(vec![1, 2, 3, 4])
//!     .skip_last(1)
//!     .scan_seeded(0, |acc, x| acc + x);
//!
//! assert_eq!(to_vec(&running_totals).await.unwrap(), vec![1, 3, 6]);
//! assert_eq!(to_vec(&running_totals).await.unwrap(), vec![1, 3, 6]);
//! # });
//! ```

use std::{future::Future, hash::Hash, sync::Arc};

use either::Either;

use crate::{
    cancel::CancellationToken,
    comparer::{EqualityComparer, KeyEq, NaturalEq},
    compose::{Downcast, Except, Intersect, Map, OfType, Scan, Seed, SelectMany, SkipLast},
    enumerator::{BoxEnumerator, Enumerator},
    error::Result,
    func::{
        AccumulateAsync, AccumulateFn, AccumulateWithCancel, Combine, CombineAsync, CombineFn,
        Project, ProjectAsync, ProjectAsyncIndexed, ProjectFn, ProjectIndexed, ProjectWithCancel,
        ProjectWithCancelIndexed, TakeInner,
    },
};

/// Shorthand for the plain `select_many` sequence type.
pub type Flatten<S, F> = SelectMany<S, ProjectFn<F>, TakeInner>;

/// A restartable, immutable factory of enumerations.
pub trait Sequence: Clone + Send + Sync + 'static {
    /// Type of produced items
    type Item: Send + 'static;

    /// Enumerator produced by [`enumerate`](Sequence::enumerate)
    type Enumerator: Enumerator<Item = Self::Item> + 'static;

    /// Starts a new, independent enumeration observing `cancel`.
    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator;

    /// Starts a new enumeration that is never cancelled.
    fn enumerator(&self) -> Self::Enumerator {
        self.enumerate(CancellationToken::new())
    }

    /// Exact element count, when it is known without enumerating.
    fn count_hint(&self) -> Option<usize> {
        None
    }

    /// All elements at once, when they can be produced without suspending.
    fn try_materialize(&self) -> Option<Vec<Self::Item>> {
        None
    }

    /// Erases the concrete sequence type.
    fn boxed(self) -> BoxSequence<Self::Item> {
        BoxSequence::new(self)
    }

    /// Projects every item with a synchronous function.
    fn map<U, F>(self, f: F) -> Map<Self, F>
    where
        F: Fn(Self::Item) -> U + Send + Sync + 'static,
        U: Send + 'static,
    {
        Map::new(self, f)
    }

    /// Expands every item into an inner sequence and yields the inner items in order.
    ///
    /// ```rust
    /// use lazyseq::prelude::*;
    ///
    /// # futures::executor::block_on(async {
    /// let expanded = from_iter(vec![1, 2]).select_many(|i| from_iter(vec![i, i * 10]));
    /// assert_eq!(to_vec(&expanded).await.unwrap(), vec![1, 10, 2, 20]);
    /// # });
    /// ```
    fn select_many<Q, F>(self, f: F) -> Flatten<Self, F>
    where
        F: Fn(Self::Item) -> Q + Send + Sync + 'static,
        Q: Sequence,
    {
        SelectMany::new(self, ProjectFn(f), TakeInner)
    }

    /// Like [`select_many`](Sequence::select_many), also passing the outer item's index.
    fn select_many_indexed<Q, F>(self, f: F) -> SelectMany<Self, ProjectIndexed<F>, TakeInner>
    where
        F: Fn(Self::Item, usize) -> Q + Send + Sync + 'static,
        Q: Sequence,
    {
        SelectMany::new(self, ProjectIndexed(f), TakeInner)
    }

    /// Like [`select_many`](Sequence::select_many) with an awaited, fallible projection.
    fn select_many_async<Q, F, Fut>(self, f: F) -> SelectMany<Self, ProjectAsync<F>, TakeInner>
    where
        F: Fn(Self::Item) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Q>> + Send + 'static,
        Q: Sequence,
    {
        SelectMany::new(self, ProjectAsync(f), TakeInner)
    }

    /// Awaited, index-aware projection.
    fn select_many_async_indexed<Q, F, Fut>(
        self,
        f: F,
    ) -> SelectMany<Self, ProjectAsyncIndexed<F>, TakeInner>
    where
        F: Fn(Self::Item, usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Q>> + Send + 'static,
        Q: Sequence,
    {
        SelectMany::new(self, ProjectAsyncIndexed(f), TakeInner)
    }

    /// Awaited projection that receives the enumeration's cancellation token.
    fn select_many_with_cancel<Q, F, Fut>(
        self,
        f: F,
    ) -> SelectMany<Self, ProjectWithCancel<F>, TakeInner>
    where
        F: Fn(Self::Item, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Q>> + Send + 'static,
        Q: Sequence,
    {
        SelectMany::new(self, ProjectWithCancel(f), TakeInner)
    }

    /// Awaited, index-aware projection that receives the cancellation token.
    fn select_many_with_cancel_indexed<Q, F, Fut>(
        self,
        f: F,
    ) -> SelectMany<Self, ProjectWithCancelIndexed<F>, TakeInner>
    where
        F: Fn(Self::Item, usize, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Q>> + Send + 'static,
        Q: Sequence,
    {
        SelectMany::new(self, ProjectWithCancelIndexed(f), TakeInner)
    }

    /// Expands every item and combines each inner item with its outer item.
    ///
    /// ```rust
    /// use lazyseq::prelude::*;
    ///
    /// # futures::executor::block_on(async {
    /// let pairs = from_iter(vec!['a', 'b'])
    ///     .select_many_with(|_| from_iter(vec![1, 2]), |c, n| format!("{c}{n}"));
    /// assert_eq!(to_vec(&pairs).await.unwrap(), vec!["a1", "a2", "b1", "b2"]);
    /// # });
    /// ```
    fn select_many_with<Q, F, R, G>(
        self,
        f: F,
        result: G,
    ) -> SelectMany<Self, ProjectFn<F>, CombineFn<G>>
    where
        Self::Item: Clone + Sync,
        F: Fn(Self::Item) -> Q + Send + Sync + 'static,
        Q: Sequence,
        G: Fn(&Self::Item, Q::Item) -> R + Send + Sync + 'static,
        R: Send + 'static,
    {
        SelectMany::new(self, ProjectFn(f), CombineFn(result))
    }

    /// Awaited projection and awaited result selector.
    fn select_many_with_async<Q, F, Fut, R, G, GFut>(
        self,
        f: F,
        result: G,
    ) -> SelectMany<Self, ProjectAsync<F>, CombineAsync<G>>
    where
        Self::Item: Clone + Sync,
        F: Fn(Self::Item) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Q>> + Send + 'static,
        Q: Sequence,
        G: Fn(Self::Item, Q::Item) -> GFut + Send + Sync + 'static,
        GFut: Future<Output = Result<R>> + Send + 'static,
        R: Send + 'static,
    {
        SelectMany::new(self, ProjectAsync(f), CombineAsync(result))
    }

    /// The generic flattening operator every `select_many` variant is built from.
    fn flat_map_with<P, C>(self, project: P, combine: C) -> SelectMany<Self, P, C>
    where
        P: Project<Self::Item>,
        C: Combine<Self::Item, <P::Inner as Sequence>::Item>,
    {
        SelectMany::new(self, project, combine)
    }

    /// Flattens a sequence of sequences.
    fn flatten(self) -> Flatten<Self, fn(Self::Item) -> Self::Item>
    where
        Self::Item: Sequence,
    {
        let identity: fn(Self::Item) -> Self::Item = |inner| inner;
        SelectMany::new(self, ProjectFn(identity), TakeInner)
    }

    /// Running fold without a seed: the first item seeds the accumulator and is not emitted.
    ///
    /// ```rust
    /// use lazyseq::prelude::*;
    ///
    /// # futures::executor::block_on(async {
    /// let sums = from_iter(vec![1, 2, 3]).scan(|acc, x| acc + x);
    /// assert_eq!(to_vec(&sums).await.unwrap(), vec![3, 6]);
    /// # });
    /// ```
    fn scan<F>(self, f: F) -> Scan<Self, Self::Item, AccumulateFn<F>>
    where
        Self::Item: Clone + Sync,
        F: Fn(Self::Item, Self::Item) -> Self::Item + Send + Sync + 'static,
    {
        Scan::new(self, Seed::first_element(), AccumulateFn(f))
    }

    /// Unseeded running fold with an awaited accumulator.
    fn scan_async<F, Fut>(self, f: F) -> Scan<Self, Self::Item, AccumulateAsync<F>>
    where
        Self::Item: Clone + Sync,
        F: Fn(Self::Item, Self::Item) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Self::Item>> + Send + 'static,
    {
        Scan::new(self, Seed::first_element(), AccumulateAsync(f))
    }

    /// Unseeded running fold whose accumulator receives the cancellation token.
    fn scan_with_cancel<F, Fut>(self, f: F) -> Scan<Self, Self::Item, AccumulateWithCancel<F>>
    where
        Self::Item: Clone + Sync,
        F: Fn(Self::Item, Self::Item, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Self::Item>> + Send + 'static,
    {
        Scan::new(self, Seed::first_element(), AccumulateWithCancel(f))
    }

    /// Running fold from `seed`: every item is folded in and each new accumulator is emitted.
    fn scan_seeded<A, F>(self, seed: A, f: F) -> Scan<Self, A, AccumulateFn<F>>
    where
        A: Clone + Send + Sync + 'static,
        F: Fn(A, Self::Item) -> A + Send + Sync + 'static,
    {
        Scan::new(self, Seed::Value(seed), AccumulateFn(f))
    }

    /// Seeded running fold with an awaited accumulator.
    fn scan_seeded_async<A, F, Fut>(self, seed: A, f: F) -> Scan<Self, A, AccumulateAsync<F>>
    where
        A: Clone + Send + Sync + 'static,
        F: Fn(A, Self::Item) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<A>> + Send + 'static,
    {
        Scan::new(self, Seed::Value(seed), AccumulateAsync(f))
    }

    /// Seeded running fold whose accumulator receives the cancellation token.
    fn scan_seeded_with_cancel<A, F, Fut>(
        self,
        seed: A,
        f: F,
    ) -> Scan<Self, A, AccumulateWithCancel<F>>
    where
        A: Clone + Send + Sync + 'static,
        F: Fn(A, Self::Item, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<A>> + Send + 'static,
    {
        Scan::new(self, Seed::Value(seed), AccumulateWithCancel(f))
    }

    /// Items of `self` also present in `other`, each emitted once, in `self`'s order.
    ///
    /// `other` is drained completely before `self` is pulled.
    fn intersect<O>(self, other: O) -> Intersect<Self, O, NaturalEq>
    where
        O: Sequence<Item = Self::Item>,
        Self::Item: Eq + Hash,
    {
        Intersect::new(self, other, NaturalEq::new())
    }

    /// [`intersect`](Sequence::intersect) under a custom comparer.
    fn intersect_with<O, C>(self, other: O, comparer: C) -> Intersect<Self, O, C>
    where
        O: Sequence<Item = Self::Item>,
        C: EqualityComparer<Self::Item>,
    {
        Intersect::new(self, other, comparer)
    }

    /// [`intersect`](Sequence::intersect) comparing a derived key.
    fn intersect_by<O, K, F>(self, other: O, key: F) -> Intersect<Self, O, KeyEq<F>>
    where
        O: Sequence<Item = Self::Item>,
        F: Fn(&Self::Item) -> K + Send + Sync + 'static,
        K: Eq + Hash,
    {
        Intersect::new(self, other, KeyEq::new(key))
    }

    /// Items of `self` absent from `other`, each emitted once, in `self`'s order.
    ///
    /// `other` is drained completely before `self` is pulled.
    fn except<O>(self, other: O) -> Except<Self, O, NaturalEq>
    where
        O: Sequence<Item = Self::Item>,
        Self::Item: Clone + Eq + Hash,
    {
        Except::new(self, other, NaturalEq::new())
    }

    /// [`except`](Sequence::except) under a custom comparer.
    fn except_with<O, C>(self, other: O, comparer: C) -> Except<Self, O, C>
    where
        O: Sequence<Item = Self::Item>,
        Self::Item: Clone,
        C: EqualityComparer<Self::Item>,
    {
        Except::new(self, other, comparer)
    }

    /// [`except`](Sequence::except) comparing a derived key.
    fn except_by<O, K, F>(self, other: O, key: F) -> Except<Self, O, KeyEq<F>>
    where
        O: Sequence<Item = Self::Item>,
        Self::Item: Clone,
        F: Fn(&Self::Item) -> K + Send + Sync + 'static,
        K: Eq + Hash,
    {
        Except::new(self, other, KeyEq::new(key))
    }

    /// Withholds the last `count` items; `0` passes everything through.
    fn skip_last(self, count: usize) -> SkipLast<Self> {
        SkipLast::new(self, count)
    }

    /// Keeps the items whose runtime kind is `U`, converting them; others are skipped.
    ///
    /// ```rust
    /// use std::any::Any;
    /// use lazyseq::prelude::*;
    ///
    /// # futures::executor::block_on(async {
    /// let bytes = defer(|| -> Vec<Box<dyn Any + Send>> {
    ///     vec![Box::new(1u8), Box::new("two"), Box::new(3u8)]
    /// })
    /// .of_type::<u8>();
    /// assert_eq!(to_vec(&bytes).await.unwrap(), vec![1, 3]);
    /// # });
    /// ```
    fn of_type<U>(self) -> OfType<Self, U>
    where
        Self::Item: Downcast<U>,
        U: Send + 'static,
    {
        OfType::new(self)
    }
}

/// Object-safe face of [`Sequence`] used by [`BoxSequence`].
trait DynSequence<T>: Send + Sync {
    fn enumerate_boxed(&self, cancel: CancellationToken) -> BoxEnumerator<T>;
    fn dyn_count_hint(&self) -> Option<usize>;
    fn dyn_try_materialize(&self) -> Option<Vec<T>>;
}

impl<S> DynSequence<S::Item> for S
where
    S: Sequence,
{
    fn enumerate_boxed(&self, cancel: CancellationToken) -> BoxEnumerator<S::Item> {
        Box::new(self.enumerate(cancel))
    }

    fn dyn_count_hint(&self) -> Option<usize> {
        Sequence::count_hint(self)
    }

    fn dyn_try_materialize(&self) -> Option<Vec<S::Item>> {
        Sequence::try_materialize(self)
    }
}

/// Type-erased sequence, for projections that return differently-typed inner sequences.
pub struct BoxSequence<T> {
    inner: Arc<dyn DynSequence<T>>,
}

impl<T> BoxSequence<T>
where
    T: Send + 'static,
{
    pub fn new<S>(sequence: S) -> Self
    where
        S: Sequence<Item = T>,
    {
        Self {
            inner: Arc::new(sequence),
        }
    }
}

impl<T> Clone for BoxSequence<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Sequence for BoxSequence<T>
where
    T: Send + 'static,
{
    type Item = T;
    type Enumerator = BoxEnumerator<T>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        self.inner.enumerate_boxed(cancel)
    }

    fn count_hint(&self) -> Option<usize> {
        self.inner.dyn_count_hint()
    }

    fn try_materialize(&self) -> Option<Vec<T>> {
        self.inner.dyn_try_materialize()
    }

    fn boxed(self) -> BoxSequence<T> {
        self
    }
}

impl<L, R> Sequence for Either<L, R>
where
    L: Sequence,
    R: Sequence<Item = L::Item>,
{
    type Item = L::Item;
    type Enumerator = Either<L::Enumerator, R::Enumerator>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        match self {
            Either::Left(l) => Either::Left(l.enumerate(cancel)),
            Either::Right(r) => Either::Right(r.enumerate(cancel)),
        }
    }

    fn count_hint(&self) -> Option<usize> {
        either::for_both!(self, s => s.count_hint())
    }

    fn try_materialize(&self) -> Option<Vec<Self::Item>> {
        either::for_both!(self, s => s.try_materialize())
    }
}
