//! Function capabilities consumed by operators.
//!
//! Operators never call user closures directly. They call one of three capabilities, and
//! the engine always passes every argument (index, cancellation token) even when the
//! concrete adapter ignores it:
//!
//! - [`Project`]: outer item → inner sequence (used by `select_many`)
//! - [`Combine`]: (outer item, inner item) → result (the `select_many` result selector)
//! - [`Accumulate`]: (accumulator, item) → accumulator (used by `scan`)
//!
//! Each has thin adapters for plain, awaited, index-aware and cancellation-aware closures.
//! Synchronous closures cannot fail; awaited ones return [`Result`].

use std::future::Future;

use async_trait::async_trait;

use crate::{cancel::CancellationToken, error::Result, sequence::Sequence};

/// Maps an outer item to the inner sequence it expands into.
#[async_trait]
pub trait Project<T>: Send + Sync + 'static {
    /// Sequence produced for each outer item
    type Inner: Sequence;

    /// Projects `item`, the `index`-th outer item of this enumeration.
    async fn project(&self, item: T, index: usize, cancel: &CancellationToken)
        -> Result<Self::Inner>;
}

/// Plain projection `Fn(T) -> Q`.
pub struct ProjectFn<F>(pub F);

/// Index-aware projection `Fn(T, usize) -> Q`.
pub struct ProjectIndexed<F>(pub F);

/// Awaited projection `Fn(T) -> impl Future<Output = Result<Q>>`.
pub struct ProjectAsync<F>(pub F);

/// Awaited, index-aware projection `Fn(T, usize) -> impl Future<Output = Result<Q>>`.
pub struct ProjectAsyncIndexed<F>(pub F);

/// Awaited projection that receives the cancellation token.
pub struct ProjectWithCancel<F>(pub F);

/// Awaited, index-aware projection that receives the cancellation token.
pub struct ProjectWithCancelIndexed<F>(pub F);

#[async_trait]
impl<T, F, Q> Project<T> for ProjectFn<F>
where
    T: Send + 'static,
    F: Fn(T) -> Q + Send + Sync + 'static,
    Q: Sequence,
{
    type Inner = Q;

    async fn project(&self, item: T, _index: usize, _cancel: &CancellationToken) -> Result<Q> {
        Ok((self.0)(item))
    }
}

#[async_trait]
impl<T, F, Q> Project<T> for ProjectIndexed<F>
where
    T: Send + 'static,
    F: Fn(T, usize) -> Q + Send + Sync + 'static,
    Q: Sequence,
{
    type Inner = Q;

    async fn project(&self, item: T, index: usize, _cancel: &CancellationToken) -> Result<Q> {
        Ok((self.0)(item, index))
    }
}

#[async_trait]
impl<T, F, Fut, Q> Project<T> for ProjectAsync<F>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Q>> + Send + 'static,
    Q: Sequence,
{
    type Inner = Q;

    async fn project(&self, item: T, _index: usize, _cancel: &CancellationToken) -> Result<Q> {
        (self.0)(item).await
    }
}

#[async_trait]
impl<T, F, Fut, Q> Project<T> for ProjectAsyncIndexed<F>
where
    T: Send + 'static,
    F: Fn(T, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Q>> + Send + 'static,
    Q: Sequence,
{
    type Inner = Q;

    async fn project(&self, item: T, index: usize, _cancel: &CancellationToken) -> Result<Q> {
        (self.0)(item, index).await
    }
}

#[async_trait]
impl<T, F, Fut, Q> Project<T> for ProjectWithCancel<F>
where
    T: Send + 'static,
    F: Fn(T, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Q>> + Send + 'static,
    Q: Sequence,
{
    type Inner = Q;

    async fn project(&self, item: T, _index: usize, cancel: &CancellationToken) -> Result<Q> {
        (self.0)(item, cancel.clone()).await
    }
}

#[async_trait]
impl<T, F, Fut, Q> Project<T> for ProjectWithCancelIndexed<F>
where
    T: Send + 'static,
    F: Fn(T, usize, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Q>> + Send + 'static,
    Q: Sequence,
{
    type Inner = Q;

    async fn project(&self, item: T, index: usize, cancel: &CancellationToken) -> Result<Q> {
        (self.0)(item, index, cancel.clone()).await
    }
}

/// Combines the retained outer item with each inner item.
///
/// `retain` runs once per outer item, before the projection consumes it.
#[async_trait]
pub trait Combine<T, U>: Send + Sync + 'static {
    /// What is kept of the outer item while its inner sequence drains
    type Retained: Send + Sync + 'static;
    /// Produced item type
    type Output: Send + 'static;

    /// Captures what `combine` will need from the outer item.
    fn retain(&self, outer: &T) -> Self::Retained;

    /// Builds the produced item for one inner item.
    async fn combine(
        &self,
        retained: &Self::Retained,
        inner: U,
        cancel: &CancellationToken,
    ) -> Result<Self::Output>;
}

/// No result selector: inner items pass through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct TakeInner;

/// Result selector `Fn(&T, U) -> R`.
pub struct CombineFn<F>(pub F);

/// Awaited result selector `Fn(T, U) -> impl Future<Output = Result<R>>`.
pub struct CombineAsync<F>(pub F);

#[async_trait]
impl<T, U> Combine<T, U> for TakeInner
where
    U: Send + 'static,
{
    type Retained = ();
    type Output = U;

    fn retain(&self, _outer: &T) -> Self::Retained {}

    async fn combine(&self, _retained: &(), inner: U, _cancel: &CancellationToken) -> Result<U> {
        Ok(inner)
    }
}

#[async_trait]
impl<T, U, F, R> Combine<T, U> for CombineFn<F>
where
    T: Clone + Send + Sync + 'static,
    U: Send + 'static,
    F: Fn(&T, U) -> R + Send + Sync + 'static,
    R: Send + 'static,
{
    type Retained = T;
    type Output = R;

    fn retain(&self, outer: &T) -> T {
        outer.clone()
    }

    async fn combine(&self, retained: &T, inner: U, _cancel: &CancellationToken) -> Result<R> {
        Ok((self.0)(retained, inner))
    }
}

#[async_trait]
impl<T, U, F, Fut, R> Combine<T, U> for CombineAsync<F>
where
    T: Clone + Send + Sync + 'static,
    U: Send + 'static,
    F: Fn(T, U) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R>> + Send + 'static,
    R: Send + 'static,
{
    type Retained = T;
    type Output = R;

    fn retain(&self, outer: &T) -> T {
        outer.clone()
    }

    async fn combine(&self, retained: &T, inner: U, _cancel: &CancellationToken) -> Result<R> {
        (self.0)(retained.clone(), inner).await
    }
}

/// Folds one item into an accumulator.
#[async_trait]
pub trait Accumulate<A, T>: Send + Sync + 'static {
    /// Returns the next accumulator value.
    async fn accumulate(&self, acc: A, item: T, cancel: &CancellationToken) -> Result<A>;
}

/// Plain fold `Fn(A, T) -> A`.
pub struct AccumulateFn<F>(pub F);

/// Awaited fold `Fn(A, T) -> impl Future<Output = Result<A>>`.
pub struct AccumulateAsync<F>(pub F);

/// Awaited fold that receives the cancellation token.
pub struct AccumulateWithCancel<F>(pub F);

#[async_trait]
impl<A, T, F> Accumulate<A, T> for AccumulateFn<F>
where
    A: Send + 'static,
    T: Send + 'static,
    F: Fn(A, T) -> A + Send + Sync + 'static,
{
    async fn accumulate(&self, acc: A, item: T, _cancel: &CancellationToken) -> Result<A> {
        Ok((self.0)(acc, item))
    }
}

#[async_trait]
impl<A, T, F, Fut> Accumulate<A, T> for AccumulateAsync<F>
where
    A: Send + 'static,
    T: Send + 'static,
    F: Fn(A, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<A>> + Send + 'static,
{
    async fn accumulate(&self, acc: A, item: T, _cancel: &CancellationToken) -> Result<A> {
        (self.0)(acc, item).await
    }
}

#[async_trait]
impl<A, T, F, Fut> Accumulate<A, T> for AccumulateWithCancel<F>
where
    A: Send + 'static,
    T: Send + 'static,
    F: Fn(A, T, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<A>> + Send + 'static,
{
    async fn accumulate(&self, acc: A, item: T, cancel: &CancellationToken) -> Result<A> {
        (self.0)(acc, item, cancel.clone()).await
    }
}
