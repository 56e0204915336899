//! Retry loop: run an operation until success, a hook verdict, or a limit.

use super::error::{LimitReason, RetryError};
use super::hooks::{AlwaysRetry, FailedAttempt, LimitReached, RetryHooks, Verdict};
use super::policy::RetryPolicy;
use super::sleep::{Sleeper, TokioSleeper};
use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// A fallible unit of work the engine may call repeatedly.
///
/// Implemented for any `FnMut() -> Future<Output = Result<T, E>>`, so plain
/// async closures work. Stateful workflows implement it directly.
#[async_trait]
pub trait Operation: Send {
    type Output: Send;
    type Error: Send;

    async fn call(&mut self) -> Result<Self::Output, Self::Error>;
}

#[async_trait]
impl<F, Fut, T, E> Operation for F
where
    F: FnMut() -> Fut + Send,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: Send,
{
    type Output = T;
    type Error = E;

    async fn call(&mut self) -> Result<T, E> {
        (self)().await
    }
}

/// Drives operations through a `RetryPolicy`. Owns the sleeper and the
/// jitter source; holds no state between `attempt` calls.
pub struct RetryEngine<S = TokioSleeper> {
    sleeper: S,
    rng: SmallRng,
}

impl Default for RetryEngine<TokioSleeper> {
    fn default() -> Self {
        Self::new(TokioSleeper)
    }
}

impl<S: Sleeper> RetryEngine<S> {
    pub fn new(sleeper: S) -> Self {
        Self {
            sleeper,
            rng: SmallRng::from_os_rng(),
        }
    }

    /// Engine with a deterministic jitter sequence.
    pub fn with_seed(sleeper: S, seed: u64) -> Self {
        Self {
            sleeper,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    fn draw_jitter(&mut self, max: Duration) -> Duration {
        if max.is_zero() {
            return Duration::ZERO;
        }
        let max_us = u64::try_from(max.as_micros()).unwrap_or(u64::MAX);
        Duration::from_micros(self.rng.random_range(0..=max_us))
    }

    /// Run `op` until it succeeds or the policy/hooks stop the loop.
    ///
    /// Attempts never overlap; hooks run between attempts. Both limits
    /// unbounded plus a permanently failing operation loops forever.
    pub async fn attempt<O, H>(
        &mut self,
        policy: &RetryPolicy,
        op: &mut O,
        hooks: &mut H,
    ) -> Result<O::Output, RetryError<O::Error>>
    where
        O: Operation + ?Sized,
        H: RetryHooks<O::Error> + ?Sized,
    {
        tracing::debug!(?policy, "starting retry loop");
        let first_attempt_at = Instant::now();
        let mut attempt = 1u32;

        loop {
            tracing::debug!(attempt, max_attempts = ?policy.max_attempts, "attempt");
            let error = match op.call().await {
                Ok(value) => {
                    tracing::debug!(attempt, "operation succeeded");
                    return Ok(value);
                }
                Err(error) => error,
            };

            let elapsed = first_attempt_at.elapsed();
            tracing::debug!(attempt, elapsed_ms = elapsed.as_millis() as u64, "operation failed");

            let limit = if policy.elapsed_exceeded(elapsed) {
                Some(LimitReason::Elapsed)
            } else if policy.max_attempts.is_exhausted_by(attempt) {
                Some(LimitReason::Attempts)
            } else {
                None
            };

            if let Some(reason) = limit {
                tracing::debug!(attempt, reason = reason.as_str(), "retry limit reached");
                hooks.on_limit_reached(&LimitReached {
                    attempt,
                    error: &error,
                    reason,
                    elapsed,
                });
                return Err(RetryError::LimitReached {
                    reason,
                    error,
                    attempts: attempt,
                    elapsed,
                });
            }

            let base_delay = policy.base_delay(attempt);
            let jitter = self.draw_jitter(policy.max_jitter);
            let next_delay = base_delay.saturating_add(jitter);
            let verdict = hooks.on_failure(&FailedAttempt {
                attempt,
                error: &error,
                base_delay,
                jitter,
                next_delay,
                elapsed,
            });

            match verdict {
                Verdict::Retry => {}
                Verdict::Abort => {
                    tracing::debug!(attempt, "retry loop aborted by hook");
                    return Err(RetryError::Aborted {
                        error,
                        attempts: attempt,
                        elapsed,
                    });
                }
                Verdict::Fatal => {
                    tracing::debug!(attempt, "retry loop stopped by fatal failure");
                    return Err(RetryError::Fatal {
                        error,
                        attempts: attempt,
                        elapsed,
                    });
                }
            }

            tracing::debug!(
                attempt,
                next_delay_ms = next_delay.as_millis() as u64,
                jitter_ms = jitter.as_millis() as u64,
                "sleeping before next attempt"
            );
            self.sleeper.sleep(next_delay).await;
            attempt = attempt.saturating_add(1);
        }
    }
}

/// Run `op` under `policy` with the tokio sleeper, retrying every failure.
pub async fn attempt<O>(
    policy: &RetryPolicy,
    mut op: O,
) -> Result<O::Output, RetryError<O::Error>>
where
    O: Operation,
{
    RetryEngine::default()
        .attempt(policy, &mut op, &mut AlwaysRetry)
        .await
}
