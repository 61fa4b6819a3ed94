//! Cancellation context
//!
//! Every host call carries a cancellation signal and, optionally, a deadline.
//! A [`Context`] bundles the two so cloud calls and backoff sleeps can give up
//! promptly.

use crate::error::{CloudError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never canceled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Derive a child context that expires after `timeout` or when the
    /// parent does, whichever comes first.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < candidate => parent,
            _ => candidate,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// The reason this context is done, if it is
    pub fn err(&self) -> Option<CloudError> {
        if self.is_canceled() {
            Some(CloudError::Canceled)
        } else if self.is_expired() {
            Some(CloudError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Time left before the deadline
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Resolves once the context is canceled or its deadline passes
    pub async fn done(&self) -> CloudError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => CloudError::Canceled,
                _ = tokio::time::sleep_until(deadline) => CloudError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                CloudError::Canceled
            }
        }
    }

    /// Drive `fut` to completion unless the context finishes first
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if let Some(err) = self.err() {
            return Err(err);
        }
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            result = fut => result,
        }
    }

    /// Sleep for `delay`, returning early with an error if the context ends
    pub async fn sleep(&self, delay: Duration) -> Result<()> {
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_child_deadline_never_extends_parent() {
        let parent = Context::background().with_timeout(Duration::from_secs(10));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());

        let tighter = parent.with_timeout(Duration::from_secs(1));
        assert!(tighter.deadline() < parent.deadline());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_propagates_to_children() {
        let parent = Context::background();
        let child = parent.with_timeout(Duration::from_secs(60));
        parent.cancel();
        assert!(child.is_canceled());
        assert!(matches!(child.err(), Some(CloudError::Canceled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_stops_at_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        let start = Instant::now();
        let result = ctx.sleep(Duration::from_secs(60)).await;
        assert!(matches!(result, Err(CloudError::DeadlineExceeded)));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_returns_canceled() {
        let ctx = Context::background();
        ctx.cancel();
        let result: Result<()> = ctx.run(async { Ok(()) }).await;
        assert!(matches!(result, Err(CloudError::Canceled)));
    }
}
