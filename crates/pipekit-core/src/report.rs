//! Reporting sink for human-readable progress notices.
//!
//! Notices are fire-and-forget: a sink never fails and is never consulted
//! for control flow.

use std::sync::Mutex;

pub trait Reporter: Send + Sync {
    /// Emit one notice line (may contain embedded newlines).
    fn notice(&self, line: &str);
}

/// Prints notices to stdout (the CI log) and mirrors them into the log file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn notice(&self, line: &str) {
        println!("{}", line);
        tracing::info!(target: "pipekit::notice", "{}", line);
    }
}

/// Keeps notices in memory, e.g. to attach them to a summary or inspect them in tests.
#[derive(Debug, Default)]
pub struct BufferedReporter {
    lines: Mutex<Vec<String>>,
}

impl BufferedReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl Reporter for BufferedReporter {
    fn notice(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn notice(&self, line: &str) {
        (**self).notice(line)
    }
}
