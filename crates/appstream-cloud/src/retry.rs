//! Retry engine
//!
//! Runs a cloud operation under an overall deadline, backing off
//! exponentially (with jitter) while a retry predicate matches the error.
//! There is no attempt cap: the timeout bounds the loop.

use crate::classify::is_canceled;
use crate::context::Context;
use crate::error::{CloudError, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Decides whether an error is transient
pub type Predicate = fn(&CloudError) -> bool;

/// Backoff multiplier applied after every retryable failure
const BACKOFF_MULTIPLIER: u32 = 2;

/// Upper bound of the random jitter, as a fraction of the current delay
const MAX_JITTER_FRACTION: f64 = 0.5;

/// Retry configuration for cloud operations
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Overall deadline for all attempts together
    pub timeout: Duration,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Cap for the exponentially growing delay
    pub max_delay: Duration,

    /// Errors matching any of these are retried
    pub retryable: Vec<Predicate>,
}

impl RetryConfig {
    pub fn new(timeout: Duration, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            timeout,
            initial_delay,
            max_delay,
            retryable: Vec::new(),
        }
    }

    pub fn retry_on(mut self, predicate: Predicate) -> Self {
        self.retryable.push(predicate);
        self
    }

    pub fn is_retryable(&self, err: &CloudError) -> bool {
        self.retryable.iter().any(|p| p(err))
    }

    /// Delay before retry number `attempt` (zero-based), without jitter
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = BACKOFF_MULTIPLIER.saturating_pow(attempt);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Compose predicates: the result matches when any of them does
pub fn any_of(predicates: &[Predicate]) -> impl Fn(&CloudError) -> bool + '_ {
    move |err| predicates.iter().any(|p| p(err))
}

fn jitter(delay: Duration) -> Duration {
    let max = delay.mul_f64(MAX_JITTER_FRACTION);
    if max.is_zero() {
        return Duration::ZERO;
    }
    let nanos = rand::rng().random_range(0..=max.as_nanos() as u64);
    Duration::from_nanos(nanos)
}

/// Execute `op` until it succeeds, fails with a non-retryable error, or the
/// configured timeout passes.
///
/// Cancellation of `ctx` stops the loop promptly with [`CloudError::Canceled`].
/// When the timeout passes, the most recent error returned by `op` is
/// surfaced rather than a generic deadline error.
pub async fn retry<T, F, Fut>(
    ctx: &Context,
    config: &RetryConfig,
    operation_name: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut(Context) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let ctx = ctx.with_timeout(config.timeout);
    let mut attempt: u32 = 0;
    let mut last_err: Option<CloudError> = None;

    loop {
        attempt += 1;

        let err = match ctx.run(op(ctx.clone())).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = %operation_name,
                        attempts = attempt,
                        "operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if is_canceled(&err) {
            return Err(finish(&ctx, err, last_err, operation_name, attempt));
        }

        if !config.is_retryable(&err) {
            debug!(
                operation = %operation_name,
                attempt,
                error = %err,
                "operation failed with non-retryable error"
            );
            return Err(err);
        }

        let base = config.delay_for_attempt(attempt - 1);
        let delay = base + jitter(base);
        warn!(
            operation = %operation_name,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "operation failed, will retry"
        );

        if let Err(stop) = ctx.sleep(delay).await {
            return Err(finish(&ctx, stop, Some(err), operation_name, attempt));
        }
        last_err = Some(err);
    }
}

/// Pick the error to surface once the context is done
fn finish(
    ctx: &Context,
    stop: CloudError,
    last_err: Option<CloudError>,
    operation_name: &str,
    attempts: u32,
) -> CloudError {
    if ctx.is_canceled() {
        debug!(operation = %operation_name, attempts, "operation canceled");
        return CloudError::Canceled;
    }
    match last_err {
        Some(err) => {
            warn!(
                operation = %operation_name,
                attempts,
                error = %err,
                "operation timed out"
            );
            err
        }
        None => stop,
    }
}
