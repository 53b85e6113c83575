//! Error types for sequence construction and enumeration.
//!
//! Failures fall into three groups:
//!
//! - **Construction**: invalid operator arguments, reported when the operator is applied
//!   ([`Error::InvalidArgument`])
//! - **Enumeration**: failures raised by an upstream enumerator or by a user-supplied
//!   function, carried verbatim to the consumer ([`Error::Failed`], [`Error::Cancelled`])
//! - **Overflow**: an index counter that would wrap ([`Error::Overflow`])
//!
//! Enumeration errors always reach the consumer after the failing enumerator has released
//! everything it holds. Nothing is retried.

use std::sync::Arc;

use thiserror::Error;

/// Boxed error accepted from user-supplied functions and sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shared form of a user or upstream failure, so `Error` stays cheap to clone.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by sequence construction and enumeration.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The cancellation token was triggered while an `advance` was in flight.
    #[error("enumeration was cancelled")]
    Cancelled,

    /// An index counter would have wrapped around.
    #[error("{operator}: index counter overflowed")]
    Overflow {
        /// Operator whose counter overflowed
        operator: &'static str,
    },

    /// An operator or source was constructed with an invalid argument.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the offending argument
        name: &'static str,
        /// Why the argument was rejected
        reason: String,
    },

    /// An upstream source or user-supplied function failed.
    #[error(transparent)]
    Failed(SharedError),
}

impl Error {
    /// Wraps an arbitrary failure.
    ///
    /// ```rust
    /// use lazyseq::Error;
    ///
    /// let err = Error::failed("disk unplugged");
    /// assert_eq!(err.to_string(), "disk unplugged");
    /// ```
    pub fn failed<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::Failed(Arc::from(error.into()))
    }

    pub(crate) fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error reports an observed cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
