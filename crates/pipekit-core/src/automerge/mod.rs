//! Automated pull-request merge.
//!
//! A two-stage workflow (observe the change, then merge it) run through the
//! retry engine. Failures are classified per stage into transient (retry),
//! abort (quiet skip) or fatal (fail the pipeline).

mod client;
mod stage;
mod workflow;

pub use client::{
    ChangeId, ChangeReviewClient, ChangeSnapshot, ChangeState, MergeResponse, TransportError,
};
pub use stage::{classify_failure, Classification, FailureKind, SkipReason, Stage, StageFailure};
pub use workflow::{Automerge, AutomergeWorkflow, MergeOutcome};
