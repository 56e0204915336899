//! Retry and backoff engine.
//!
//! `RetryEngine` runs a fallible operation under a `RetryPolicy`
//! (attempt and elapsed-time limits, exponential backoff, additive jitter)
//! and asks `RetryHooks` what to do after each failure. It knows nothing
//! about what the operation does; workflows layer their own failure
//! classification on top by implementing the hooks.

mod classify;
mod error;
mod hooks;
mod policy;
mod run;
mod sleep;

pub use classify::{classify_curl_error, classify_status, NetworkKind, StatusClass};
pub use error::{LimitReason, RetryError};
pub use hooks::{AlwaysRetry, ClassifyWith, FailedAttempt, LimitReached, RetryHooks, Verdict};
pub use policy::{AttemptLimit, RetryPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_MIN_DELAY};
pub use run::{attempt, Operation, RetryEngine};
pub use sleep::{CancellableSleeper, NoopSleeper, Sleeper, TokioSleeper};
