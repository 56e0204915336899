use std::time::Duration;

/// Default attempt ceiling when the caller does not configure one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
/// Default minimum base delay between attempts.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(100);

/// Upper bound on the number of attempts.
///
/// A raw count of `0` (as written in config files) converts to `Unbounded`,
/// not to "zero attempts".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptLimit {
    /// Keep attempting until another limit (or a hook) stops the loop.
    Unbounded,
    /// Stop once this many attempts (including the first) have failed.
    Max(u32),
}

impl AttemptLimit {
    /// Interpret a raw attempt count where `0` means unbounded.
    pub fn from_count(count: u32) -> Self {
        if count == 0 {
            AttemptLimit::Unbounded
        } else {
            AttemptLimit::Max(count)
        }
    }

    /// True when `attempt` (1-based) has used up the budget.
    pub fn is_exhausted_by(&self, attempt: u32) -> bool {
        match self {
            AttemptLimit::Unbounded => false,
            AttemptLimit::Max(max) => attempt >= *max,
        }
    }
}

impl From<u32> for AttemptLimit {
    fn from(count: u32) -> Self {
        AttemptLimit::from_count(count)
    }
}

impl Default for AttemptLimit {
    fn default() -> Self {
        AttemptLimit::Max(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Exponential backoff policy with dual limits and additive jitter.
///
/// Constructed fresh per call site; the engine never mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: AttemptLimit,
    /// Ceiling on time spent since the first attempt started (None = unbounded).
    pub max_total_elapsed: Option<Duration>,
    /// Base delay before the first retry; doubles on each subsequent one.
    pub min_delay: Duration,
    /// Cap applied to the base delay before jitter (None = uncapped).
    pub max_delay: Option<Duration>,
    /// Upper bound of the random delay added on top of every base delay.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: AttemptLimit::default(),
            max_total_elapsed: None,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: None,
            max_jitter: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Policy used for long-lived waits on external services: unbounded
    /// attempts, a finite elapsed ceiling, 10s..30s backoff and 5s of jitter.
    pub fn long_running(ceiling: Duration) -> Self {
        Self {
            max_attempts: AttemptLimit::Unbounded,
            max_total_elapsed: Some(ceiling),
            min_delay: Duration::from_secs(10),
            max_delay: Some(Duration::from_secs(30)),
            max_jitter: Duration::from_secs(5),
        }
    }

    /// Policy that tries exactly once.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: AttemptLimit::Max(1),
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, limit: impl Into<AttemptLimit>) -> Self {
        self.max_attempts = limit.into();
        self
    }

    pub fn with_max_total_elapsed(mut self, ceiling: Duration) -> Self {
        self.max_total_elapsed = Some(ceiling);
        self
    }

    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    pub fn with_max_jitter(mut self, jitter: Duration) -> Self {
        self.max_jitter = jitter;
        self
    }

    /// Base (pre-jitter) delay after failed attempt `attempt` (1-based):
    /// `min(max_delay, 2^(attempt-1) * min_delay)`. Saturates instead of overflowing.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1);
        let raw = match 2u32.checked_pow(exp) {
            Some(factor) => self.min_delay.saturating_mul(factor),
            None if self.min_delay.is_zero() => Duration::ZERO,
            None => Duration::MAX,
        };
        match self.max_delay {
            Some(cap) => raw.min(cap),
            None => raw,
        }
    }

    /// True when `elapsed` has gone past the configured ceiling.
    pub fn elapsed_exceeded(&self, elapsed: Duration) -> bool {
        self.max_total_elapsed
            .is_some_and(|ceiling| elapsed > ceiling)
    }
}
