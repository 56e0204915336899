//! Caller-supplied decisions between attempts.

use super::error::LimitReason;
use std::time::Duration;

/// What to do after a failed attempt that is still within the policy limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Sleep for the computed delay and try again.
    Retry,
    /// Stop quietly; the loop resolves as `RetryError::Aborted`.
    Abort,
    /// Stop and propagate the error as `RetryError::Fatal`.
    Fatal,
}

/// A failed attempt as seen by `RetryHooks::on_failure`.
#[derive(Debug)]
pub struct FailedAttempt<'a, E> {
    /// 1-based attempt number.
    pub attempt: u32,
    pub error: &'a E,
    /// Backoff delay before jitter.
    pub base_delay: Duration,
    /// Random extra delay drawn for this attempt.
    pub jitter: Duration,
    /// `base_delay + jitter`: how long the engine will sleep on `Retry`.
    pub next_delay: Duration,
    /// Time since the first attempt started.
    pub elapsed: Duration,
}

/// The limit report passed to `RetryHooks::on_limit_reached`.
#[derive(Debug)]
pub struct LimitReached<'a, E> {
    pub attempt: u32,
    pub error: &'a E,
    pub reason: LimitReason,
    pub elapsed: Duration,
}

/// Hooks invoked by the engine. Both run synchronously with respect to the
/// loop: the next attempt never starts before they return.
pub trait RetryHooks<E> {
    /// Called after each failed attempt that has not exceeded a limit.
    fn on_failure(&mut self, failure: &FailedAttempt<'_, E>) -> Verdict {
        let _ = failure;
        Verdict::Retry
    }

    /// Called exactly once when a limit is exceeded.
    fn on_limit_reached(&mut self, limit: &LimitReached<'_, E>) {
        let _ = limit;
    }
}

/// Retries every failure and reports nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E> RetryHooks<E> for AlwaysRetry {}

/// Hooks built from a single classification closure.
pub struct ClassifyWith<F>(pub F);

impl<E, F> RetryHooks<E> for ClassifyWith<F>
where
    F: FnMut(&FailedAttempt<'_, E>) -> Verdict,
{
    fn on_failure(&mut self, failure: &FailedAttempt<'_, E>) -> Verdict {
        (self.0)(failure)
    }
}

impl<E, H: RetryHooks<E> + ?Sized> RetryHooks<E> for &mut H {
    fn on_failure(&mut self, failure: &FailedAttempt<'_, E>) -> Verdict {
        (**self).on_failure(failure)
    }

    fn on_limit_reached(&mut self, limit: &LimitReached<'_, E>) {
        (**self).on_limit_reached(limit)
    }
}
