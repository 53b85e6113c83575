//! Membership collection keyed by an [`EqualityComparer`].

use hashbrown::hash_table::{Entry, HashTable};

use crate::comparer::EqualityComparer;

/// A set whose notion of equality comes from a comparer rather than from `T` itself.
///
/// ```rust
/// use lazyseq::comparer::NaturalEq;
/// use lazyseq::set::ComparerSet;
///
/// let mut set = ComparerSet::new(NaturalEq::new());
/// assert!(set.insert(1));
/// assert!(!set.insert(1));
/// assert!(set.remove(&1));
/// assert!(set.is_empty());
/// ```
pub struct ComparerSet<T, C> {
    table: HashTable<T>,
    comparer: C,
}

impl<T, C> ComparerSet<T, C>
where
    C: EqualityComparer<T>,
{
    pub fn new(comparer: C) -> Self {
        Self {
            table: HashTable::new(),
            comparer,
        }
    }

    /// Adds `item`, returning `false` if an equal item was already present.
    pub fn insert(&mut self, item: T) -> bool {
        let comparer = &self.comparer;
        let entry = self.table.entry(
            comparer.hash(&item),
            |held| comparer.equals(held, &item),
            |held| comparer.hash(held),
        );
        match entry {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(item);
                true
            }
        }
    }

    /// Removes the item equal to `item`, returning whether one was present.
    pub fn remove(&mut self, item: &T) -> bool {
        let comparer = &self.comparer;
        match self
            .table
            .find_entry(comparer.hash(item), |held| comparer.equals(held, item))
        {
            Ok(found) => {
                found.remove();
                true
            }
            Err(_) => false,
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.table
            .find(self.comparer.hash(item), |held| self.comparer.equals(held, item))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
