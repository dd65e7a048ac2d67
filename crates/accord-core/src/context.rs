// SPDX-FileCopyrightText: 2026 Accord Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cancellation and deadline carried through every store operation.
//!
//! Reads race [`RequestContext::done`] and give up as soon as it fires.
//! Writes check [`RequestContext::err`] when their unit reaches the front of
//! the writer queue, so a cancelled write is skipped without reordering the
//! units behind it.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::AccordError;

/// Per-request cancellation token plus optional deadline.
///
/// Cloning is cheap and clones share the same token, so cancelling any
/// clone cancels them all.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context that is never done unless explicitly cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context expiring `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// `Some` once the context is cancelled or past its deadline.
    pub fn err(&self) -> Option<AccordError> {
        if self.token.is_cancelled() {
            return Some(AccordError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Some(AccordError::DeadlineExceeded { deadline })
            }
            _ => None,
        }
    }

    /// Resolves with the context error once the context is done.
    pub async fn done(&self) -> AccordError {
        match self.deadline {
            Some(deadline) => {
                let sleep = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline));
                tokio::select! {
                    _ = self.token.cancelled() => AccordError::Cancelled,
                    _ = sleep => AccordError::DeadlineExceeded { deadline },
                }
            }
            None => {
                self.token.cancelled().await;
                AccordError::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_not_done() {
        assert!(RequestContext::background().err().is_none());
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let ctx = RequestContext::background();
        let clone = ctx.clone();
        clone.cancel();
        assert!(matches!(ctx.err(), Some(AccordError::Cancelled)));
    }

    #[test]
    fn expired_deadline_reports_error() {
        let ctx = RequestContext::with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(matches!(
            ctx.err(),
            Some(AccordError::DeadlineExceeded { .. })
        ));
    }

    #[tokio::test]
    async fn done_resolves_on_cancel() {
        let ctx = RequestContext::background();
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.done().await });
        ctx.cancel();
        let err = handle.await.unwrap();
        assert!(matches!(err, AccordError::Cancelled));
    }

    #[tokio::test]
    async fn done_resolves_on_deadline() {
        let ctx = RequestContext::with_timeout(Duration::from_millis(20));
        let err = ctx.done().await;
        assert!(matches!(err, AccordError::DeadlineExceeded { .. }));
    }
}
