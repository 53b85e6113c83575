//! Equality capabilities for the set-based operators.

use std::{
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hash},
    sync::Arc,
};

/// Decides element equality and supplies a hash consistent with it.
///
/// `equals(a, b)` must imply `hash(a) == hash(b)`.
pub trait EqualityComparer<T>: Send + Sync + 'static {
    /// Returns `true` if `a` and `b` are equal under this comparer.
    fn equals(&self, a: &T, b: &T) -> bool;

    /// Hashes `value` consistently with [`equals`](EqualityComparer::equals).
    fn hash(&self, value: &T) -> u64;
}

/// Natural equality through [`Eq`] and [`Hash`]; the default comparer.
#[derive(Debug, Clone, Default)]
pub struct NaturalEq {
    state: RandomState,
}

impl NaturalEq {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T> EqualityComparer<T> for NaturalEq
where
    T: Eq + Hash,
{
    fn equals(&self, a: &T, b: &T) -> bool {
        a == b
    }

    fn hash(&self, value: &T) -> u64 {
        self.state.hash_one(value)
    }
}

/// Compares elements by a derived key.
///
/// ```rust
/// use lazyseq::comparer::{EqualityComparer, KeyEq};
///
/// let by_len = KeyEq::new(|s: &&str| s.len());
/// assert!(by_len.equals(&"abc", &"xyz"));
/// assert!(!by_len.equals(&"ab", &"xyz"));
/// ```
pub struct KeyEq<F> {
    key: F,
    state: RandomState,
}

impl<F> KeyEq<F> {
    pub fn new(key: F) -> Self {
        Self {
            key,
            state: RandomState::new(),
        }
    }
}

impl<T, K, F> EqualityComparer<T> for KeyEq<F>
where
    F: Fn(&T) -> K + Send + Sync + 'static,
    K: Eq + Hash,
{
    fn equals(&self, a: &T, b: &T) -> bool {
        (self.key)(a) == (self.key)(b)
    }

    fn hash(&self, value: &T) -> u64 {
        self.state.hash_one((self.key)(value))
    }
}

impl<T, C> EqualityComparer<T> for Arc<C>
where
    C: EqualityComparer<T>,
{
    fn equals(&self, a: &T, b: &T) -> bool {
        (**self).equals(a, b)
    }

    fn hash(&self, value: &T) -> u64 {
        (**self).hash(value)
    }
}
