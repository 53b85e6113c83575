use async_trait::async_trait;

use crate::{
    cancel::CancellationToken,
    error::Result,
    iter::{AsyncIter, IterLogic},
    sequence::Sequence,
    validate,
};

/// `count` consecutive integers starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: i64,
    count: usize,
}

/// Creates the sequence `start, start + 1, ..., start + count - 1`.
///
/// Fails if `count` is negative or the last value would overflow `i64`.
///
/// ```rust
/// use lazyseq::prelude::*;
///
/// # futures::executor::block_on(async {
/// assert_eq!(to_vec(&range(-1, 3).unwrap()).await.unwrap(), vec![-1, 0, 1]);
/// assert!(range(0, -1).is_err());
/// assert!(range(i64::MAX, 2).is_err());
/// # });
/// ```
pub fn range(start: i64, count: i64) -> Result<Range> {
    let count = validate::non_negative("count", count)?;
    validate::fits_after("count", start, count)?;
    Ok(Range { start, count })
}

impl Range {
    fn value_at(&self, offset: usize) -> i64 {
        // offsets are bounded by `count`, which `range` checked against `i64`
        self.start.wrapping_add(offset as i64)
    }
}

impl Sequence for Range {
    type Item = i64;
    type Enumerator = AsyncIter<RangeLogic>;

    fn enumerate(&self, cancel: CancellationToken) -> Self::Enumerator {
        AsyncIter::new(
            RangeLogic {
                range: *self,
                offset: 0,
            },
            cancel,
        )
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.count)
    }

    fn try_materialize(&self) -> Option<Vec<i64>> {
        Some((0..self.count).map(|offset| self.value_at(offset)).collect())
    }
}

pub struct RangeLogic {
    range: Range,
    offset: usize,
}

#[async_trait]
impl IterLogic for RangeLogic {
    type Item = i64;
    const NAME: &'static str = "range";

    fn acquire(&mut self, _cancel: &CancellationToken) -> Result<()> {
        self.offset = 0;
        Ok(())
    }

    async fn step(&mut self, _cancel: &CancellationToken) -> Result<Option<i64>> {
        if self.offset >= self.range.count {
            return Ok(None);
        }
        let value = self.range.value_at(self.offset);
        self.offset += 1;
        Ok(Some(value))
    }

    async fn release(&mut self) {
        self.offset = self.range.count;
    }

    fn fresh(&self) -> Self {
        Self {
            range: self.range,
            offset: 0,
        }
    }
}
