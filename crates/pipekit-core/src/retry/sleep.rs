//! Sleep abstraction used between attempts.
//!
//! Production code sleeps on the tokio timer; tests swap in `NoopSleeper` or
//! `RecordingSleeper` so retry-heavy paths run instantly.

use crate::control::Cancellation;
use async_trait::async_trait;
#[cfg(test)]
use std::sync::Mutex;
use std::time::Duration;

#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Wait for `delay` without blocking the runtime thread.
    async fn sleep(&self, delay: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSleeper;

#[async_trait]
impl Sleeper for NoopSleeper {
    async fn sleep(&self, _delay: Duration) {}
}

/// Tokio sleep that returns early when the run is cancelled.
#[derive(Debug, Clone)]
pub struct CancellableSleeper {
    cancel: Cancellation,
}

impl CancellableSleeper {
    pub fn new(cancel: Cancellation) -> Self {
        Self { cancel }
    }
}

#[async_trait]
impl Sleeper for CancellableSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.cancel.cancelled() => {
                tracing::debug!("sleep interrupted by cancellation");
            }
        }
    }
}

/// Records requested delays and returns immediately.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

#[cfg(test)]
impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in call order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(delay);
        }
    }
}

#[async_trait]
impl<S: Sleeper + ?Sized> Sleeper for &S {
    async fn sleep(&self, delay: Duration) {
        (**self).sleep(delay).await;
    }
}
