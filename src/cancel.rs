//! Cancellation plumbing shared by every enumerator.
//!
//! A [`CancellationToken`] is handed to [`Sequence::enumerate`](crate::Sequence::enumerate)
//! and cloned into each upstream enumerator, so a single `cancel()` reaches the whole chain.

use std::future::Future;

pub use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Races `future` against `cancel`, checking the token first.
///
/// Resolves to [`Error::Cancelled`] as soon as the token fires; `future` is dropped at its
/// current suspension point in that case.
///
/// ```rust
/// use lazyseq::cancel::{guarded, CancellationToken};
///
/// # futures::executor::block_on(async {
/// let token = CancellationToken::new();
/// assert_eq!(guarded(&token, async { Ok(7) }).await.unwrap(), 7);
///
/// token.cancel();
/// assert!(guarded(&token, async { Ok(7) }).await.unwrap_err().is_cancelled());
/// # });
/// ```
pub async fn guarded<T, F>(cancel: &CancellationToken, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(Error::Cancelled),
        result = future => result,
    }
}

/// Fails with [`Error::Cancelled`] if the token has already fired.
pub fn check(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(Error::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guarded_prefers_cancellation_over_ready_future() {
        let token = CancellationToken::new();
        token.cancel();

        let result = guarded(&token, async { Ok::<_, Error>(1) }).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_guarded_interrupts_pending_future() {
        let token = CancellationToken::new();
        let trigger = token.clone();

        let (result, ()) = tokio::join!(
            guarded(&token, std::future::pending::<Result<()>>()),
            async move {
                tokio::task::yield_now().await;
                trigger.cancel();
            }
        );
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_check_reports_fired_token() {
        let token = CancellationToken::new();
        assert!(check(&token).is_ok());
        token.cancel();
        assert!(check(&token).is_err());
    }
}
