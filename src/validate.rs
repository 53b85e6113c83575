//! Construction-time argument checks.
//!
//! Operators and sources call these when they are built, so invalid arguments fail before
//! any enumeration starts.

use crate::error::{Error, Result};

/// Accepts a count that must not be negative.
///
/// ```rust
/// use lazyseq::validate::non_negative;
///
/// assert_eq!(non_negative("count", 3).unwrap(), 3);
/// assert!(non_negative("count", -1).is_err());
/// ```
pub fn non_negative(name: &'static str, value: i64) -> Result<usize> {
    if value < 0 {
        return Err(Error::invalid_argument(
            name,
            format!("must not be negative (got {value})"),
        ));
    }
    usize::try_from(value)
        .map_err(|_| Error::invalid_argument(name, format!("{value} does not fit in usize")))
}

/// Checks that `count` consecutive values starting at `start` stay within `i64`.
pub fn fits_after(name: &'static str, start: i64, count: usize) -> Result<()> {
    let Some(span) = count.checked_sub(1) else {
        return Ok(());
    };
    i64::try_from(span)
        .ok()
        .and_then(|span| start.checked_add(span))
        .map(|_| ())
        .ok_or_else(|| {
            Error::invalid_argument(name, format!("{count} values from {start} overflow i64"))
        })
}
