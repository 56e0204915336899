//! Terminal results of a retry loop that did not end in success.

use std::fmt;
use std::time::Duration;

/// Which limit stopped the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitReason {
    /// The attempt budget was used up.
    Attempts,
    /// Time since the first attempt passed the elapsed ceiling.
    Elapsed,
}

impl LimitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitReason::Attempts => "attempts",
            LimitReason::Elapsed => "elapsed",
        }
    }
}

impl fmt::Display for LimitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LimitReason::Attempts => write!(f, "attempts"),
            LimitReason::Elapsed => write!(f, "elapsed runtime"),
        }
    }
}

/// Why `attempt` gave up. Each variant carries the last error the operation
/// produced, the attempt it happened on, and the time since the first attempt.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// `on_failure` returned `Verdict::Abort`.
    #[error("attempted execution was aborted")]
    Aborted {
        error: E,
        attempts: u32,
        elapsed: Duration,
    },
    /// `on_failure` returned `Verdict::Fatal`.
    #[error("fatal failure on attempt #{attempts}: {error}")]
    Fatal {
        error: E,
        attempts: u32,
        elapsed: Duration,
    },
    /// A policy limit was exceeded; `on_limit_reached` has already run.
    #[error("maximum {reason} exceeded while retrying function: {error}")]
    LimitReached {
        reason: LimitReason,
        error: E,
        attempts: u32,
        elapsed: Duration,
    },
}

impl<E> RetryError<E> {
    /// The last error returned by the operation.
    pub fn error(&self) -> &E {
        match self {
            RetryError::Aborted { error, .. }
            | RetryError::Fatal { error, .. }
            | RetryError::LimitReached { error, .. } => error,
        }
    }

    pub fn into_error(self) -> E {
        match self {
            RetryError::Aborted { error, .. }
            | RetryError::Fatal { error, .. }
            | RetryError::LimitReached { error, .. } => error,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Aborted { attempts, .. }
            | RetryError::Fatal { attempts, .. }
            | RetryError::LimitReached { attempts, .. } => *attempts,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            RetryError::Aborted { elapsed, .. }
            | RetryError::Fatal { elapsed, .. }
            | RetryError::LimitReached { elapsed, .. } => *elapsed,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, RetryError::Aborted { .. })
    }

    pub fn limit_reason(&self) -> Option<LimitReason> {
        match self {
            RetryError::LimitReached { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}
