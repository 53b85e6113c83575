/// Result of a single pull on an [`Enumerator`](crate::Enumerator).
///
/// `Produced` means the enumerator now holds a current item, readable through
/// [`current`](crate::Enumerator::current) until the next `advance` or `release`.
/// `Exhausted` is terminal: every later `advance` reports it again.
///
/// # Examples
///
/// ```rust
/// use lazyseq::Outcome;
///
/// let produced = Outcome::Produced;
/// assert!(produced.is_produced());
/// assert!(Outcome::Exhausted.is_exhausted());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// An item was produced and is available as the current item
    Produced,
    /// No further items will be produced
    Exhausted,
}

impl Outcome {
    /// Returns `true` if the outcome is `Produced`.
    #[inline]
    pub const fn is_produced(&self) -> bool {
        matches!(self, Outcome::Produced)
    }

    /// Returns `true` if the outcome is `Exhausted`.
    #[inline]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Outcome::Exhausted)
    }

    /// Converts a step result into an outcome, keeping the produced value aside.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lazyseq::Outcome;
    ///
    /// let (outcome, item) = Outcome::split(Some(3));
    /// assert_eq!(outcome, Outcome::Produced);
    /// assert_eq!(item, Some(3));
    ///
    /// let (outcome, item) = Outcome::split::<i32>(None);
    /// assert_eq!(outcome, Outcome::Exhausted);
    /// assert_eq!(item, None);
    /// ```
    #[inline]
    pub fn split<T>(step: Option<T>) -> (Outcome, Option<T>) {
        match step {
            Some(item) => (Outcome::Produced, Some(item)),
            None => (Outcome::Exhausted, None),
        }
    }
}
