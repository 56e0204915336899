//! Stage machine and failure classification for the automerge workflow.
//!
//! The same status code means different things depending on the stage that
//! produced it, so classification always looks at `(stage, failure)`.

use super::client::TransportError;
use crate::retry::{classify_status, StatusClass, Verdict};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Read-only precondition check.
    Observe,
    /// The state-changing merge call.
    Act,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Observe => write!(f, "observe"),
            Stage::Act => write!(f, "act"),
        }
    }
}

/// Why the workflow decided not to merge. None of these fail the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 404 while reading: the change disappeared before we looked.
    ChangeMissing,
    AlreadyMerged,
    Draft,
    NotOpen,
    /// 404 while merging: the change disappeared between look and act.
    TargetVanished,
    /// 409 while merging: the observed head commit is stale.
    HeadOutOfSync,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            SkipReason::ChangeMissing => "change no longer exists",
            SkipReason::AlreadyMerged => "already merged",
            SkipReason::Draft => "marked as draft",
            SkipReason::NotOpen => "no longer open",
            SkipReason::TargetVanished => "this task's own target vanished",
            SkipReason::HeadOutOfSync => "HEAD is out of sync",
        };
        f.write_str(msg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The remote call itself failed.
    Transport(TransportError),
    /// The observed state rules out a merge.
    Skip(SkipReason),
    /// The merge call succeeded but reported that nothing was merged.
    NotApplied(String),
    /// The run was cancelled before the attempt started.
    Cancelled,
}

/// A failed attempt, tagged with the stage it failed in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage} stage: {kind}")]
pub struct StageFailure {
    pub stage: Stage,
    pub kind: FailureKind,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transport(e) => write!(f, "{}", e),
            FailureKind::Skip(reason) => write!(f, "{}", reason),
            FailureKind::NotApplied(message) if message.is_empty() => {
                write!(f, "merge attempt failed")
            }
            FailureKind::NotApplied(message) => write!(f, "merge attempt failed: {}", message),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl StageFailure {
    pub fn new(stage: Stage, kind: FailureKind) -> Self {
        Self { stage, kind }
    }

    pub fn transport(stage: Stage, error: TransportError) -> Self {
        Self::new(stage, FailureKind::Transport(error))
    }
}

/// How a failure is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Retry after backoff.
    Transient,
    /// Stop quietly; the run resolves as skipped.
    Abort(SkipReason),
    /// Stop and fail the run.
    Fatal,
}

impl Classification {
    pub fn verdict(&self) -> Verdict {
        match self {
            Classification::Transient => Verdict::Retry,
            Classification::Abort(_) => Verdict::Abort,
            Classification::Fatal => Verdict::Fatal,
        }
    }
}

/// Map a stage failure onto Transient / Abort / Fatal.
pub fn classify_failure(failure: &StageFailure) -> Classification {
    match &failure.kind {
        FailureKind::Skip(reason) => Classification::Abort(*reason),
        FailureKind::NotApplied(_) | FailureKind::Cancelled => Classification::Fatal,
        FailureKind::Transport(e) => classify_transport(failure.stage, e),
    }
}

fn classify_transport(stage: Stage, error: &TransportError) -> Classification {
    match error {
        TransportError::Network { kind, .. } if kind.is_retryable() => Classification::Transient,
        TransportError::Network { .. } | TransportError::Decode(_) => Classification::Fatal,
        TransportError::Status { code, .. } => match (stage, classify_status(*code)) {
            (_, StatusClass::Retryable) => Classification::Transient,
            (Stage::Observe, StatusClass::NotFound) => {
                Classification::Abort(SkipReason::ChangeMissing)
            }
            (Stage::Act, StatusClass::NotFound) => {
                Classification::Abort(SkipReason::TargetVanished)
            }
            (Stage::Act, StatusClass::Conflict) => {
                Classification::Abort(SkipReason::HeadOutOfSync)
            }
            (Stage::Observe, StatusClass::Conflict) | (_, StatusClass::Other) => {
                Classification::Fatal
            }
        },
    }
}
