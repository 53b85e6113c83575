//! Functions for driving sequences to completion.
//!
//! Every driver releases the enumerator it opens, whether enumeration ends normally, fails,
//! or the callback stops it early. Sources that can hand over all of their items without
//! suspending skip the enumerator entirely.

use std::future::Future;

use tracing::trace;

use crate::{
    cancel::{self, CancellationToken},
    enumerator::Enumerator,
    error::{Error, Result},
    sequence::Sequence,
};

/// Collects every item of `seq` into a vector.
///
/// ```rust
/// use lazyseq::prelude::*;
///
/// # futures::executor::block_on(async {
/// let seq = range(1, 3).unwrap().map(|n| n * n);
/// assert_eq!(to_vec(&seq).await.unwrap(), vec![1, 4, 9]);
/// # });
/// ```
pub async fn to_vec<S: Sequence>(seq: &S) -> Result<Vec<S::Item>> {
    to_vec_with(seq, CancellationToken::new()).await
}

/// Cancellable [`to_vec`].
pub async fn to_vec_with<S: Sequence>(seq: &S, cancel: CancellationToken) -> Result<Vec<S::Item>> {
    cancel::check(&cancel)?;
    if let Some(items) = seq.try_materialize() {
        trace!(len = items.len(), "materialized without enumerating");
        return Ok(items);
    }

    let mut cursor = seq.enumerate(cancel);
    let mut items = Vec::with_capacity(seq.count_hint().unwrap_or(0));
    let result = async {
        while let Some(item) = cursor.next_item().await? {
            items.push(item);
        }
        Ok::<_, Error>(())
    }
    .await;
    cursor.release().await;
    result.map(|()| items)
}

/// Counts the items of `seq`, enumerating only when the count is not known up front.
pub async fn count<S: Sequence>(seq: &S) -> Result<usize> {
    if let Some(n) = seq.count_hint() {
        return Ok(n);
    }

    let mut cursor = seq.enumerator();
    let mut n = 0usize;
    let result = async {
        while cursor.next_item().await?.is_some() {
            n += 1;
        }
        Ok::<_, Error>(())
    }
    .await;
    cursor.release().await;
    result.map(|()| n)
}

/// Calls `f` for every item, in order, awaiting each call before pulling the next item.
///
/// An error from `f` stops the enumeration and is returned after the enumerator is released.
pub async fn for_each<S, F, Fut>(seq: &S, cancel: CancellationToken, mut f: F) -> Result<()>
where
    S: Sequence,
    F: FnMut(S::Item) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut cursor = seq.enumerate(cancel);
    let result = async {
        while let Some(item) = cursor.next_item().await? {
            f(item).await?;
        }
        Ok::<_, Error>(())
    }
    .await;
    cursor.release().await;
    result
}
