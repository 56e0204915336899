//! Observe-then-act merge driven by the retry engine.

use super::client::{ChangeId, ChangeReviewClient, ChangeSnapshot, ChangeState};
use super::stage::{classify_failure, Classification, FailureKind, SkipReason, Stage, StageFailure};
use crate::control::Cancellation;
use crate::error::ActionError;
use crate::report::Reporter;
use crate::retry::{
    FailedAttempt, LimitReached, Operation, RetryEngine, RetryError, RetryHooks, RetryPolicy,
    Sleeper, TokioSleeper, Verdict,
};
use async_trait::async_trait;

/// How an automerge run ended without failing the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The change was merged at this head commit.
    Merged { head_ref: String },
    /// The workflow decided not to merge.
    Skipped(SkipReason),
}

/// Per-run state machine. Single use: one `Automerge::run` call creates one,
/// drives it from `Observe` to a terminal result, and drops it.
#[derive(Debug)]
pub struct AutomergeWorkflow<'a, C: ?Sized> {
    client: &'a C,
    change: ChangeId,
    stage: Stage,
    head_ref: Option<String>,
    cancel: Option<Cancellation>,
}

impl<'a, C: ChangeReviewClient + ?Sized> AutomergeWorkflow<'a, C> {
    pub fn new(client: &'a C, change: ChangeId) -> Self {
        Self {
            client,
            change,
            stage: Stage::Observe,
            head_ref: None,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Head commit captured by a successful observe, if any.
    pub fn head_ref(&self) -> Option<&str> {
        self.head_ref.as_deref()
    }

    fn fail(&self, kind: FailureKind) -> StageFailure {
        StageFailure::new(self.stage, kind)
    }

    async fn observe(&self) -> Result<String, StageFailure> {
        let snapshot = self
            .client
            .fetch(self.change)
            .await
            .map_err(|e| self.fail(FailureKind::Transport(e)))?;
        if let Some(reason) = skip_reason(&snapshot) {
            return Err(self.fail(FailureKind::Skip(reason)));
        }
        tracing::debug!(change = %self.change, head = %snapshot.head_ref, "change is mergeable");
        Ok(snapshot.head_ref)
    }

    async fn act(&self, head_ref: &str) -> Result<(), StageFailure> {
        let response = self
            .client
            .merge(self.change, head_ref)
            .await
            .map_err(|e| self.fail(FailureKind::Transport(e)))?;
        if !response.merged {
            return Err(self.fail(FailureKind::NotApplied(response.message)));
        }
        Ok(())
    }
}

/// Reason the observed state rules out a merge, checked in priority order.
fn skip_reason(snapshot: &ChangeSnapshot) -> Option<SkipReason> {
    if snapshot.merged {
        Some(SkipReason::AlreadyMerged)
    } else if snapshot.draft {
        Some(SkipReason::Draft)
    } else if snapshot.state != ChangeState::Open {
        Some(SkipReason::NotOpen)
    } else {
        None
    }
}

#[async_trait]
impl<'a, C: ChangeReviewClient + ?Sized> Operation for AutomergeWorkflow<'a, C> {
    type Output = String;
    type Error = StageFailure;

    async fn call(&mut self) -> Result<String, StageFailure> {
        if let Some(cancel) = &self.cancel {
            cancel.check().map_err(|_| self.fail(FailureKind::Cancelled))?;
        }

        if self.stage == Stage::Observe {
            let head_ref = self.observe().await?;
            self.head_ref = Some(head_ref);
            self.stage = Stage::Act;
        }

        let head_ref = self.head_ref.clone().unwrap_or_default();
        self.act(&head_ref).await?;
        Ok(head_ref)
    }
}

/// Hooks translating stage failures into retry verdicts.
struct AutomergeHooks<'r, R: ?Sized> {
    reporter: &'r R,
    change: ChangeId,
}

impl<R: Reporter + ?Sized> RetryHooks<StageFailure> for AutomergeHooks<'_, R> {
    fn on_failure(&mut self, failure: &FailedAttempt<'_, StageFailure>) -> Verdict {
        let class = classify_failure(failure.error);
        if class == Classification::Transient {
            self.reporter.notice(&format!(
                "transient failure at {}s: attempt #{} merging {} did not succeed: {}\n---\n\
                 next attempt in {} seconds...",
                failure.elapsed.as_secs(),
                failure.attempt,
                self.change,
                failure.error,
                failure.next_delay.as_secs(),
            ));
        }
        class.verdict()
    }

    fn on_limit_reached(&mut self, limit: &LimitReached<'_, StageFailure>) {
        tracing::warn!(
            change = %self.change,
            attempts = limit.attempt,
            reason = limit.reason.as_str(),
            "automerge retry limit reached: {}",
            limit.error
        );
    }
}

/// Entry point for automerging a change under a retry policy.
pub struct Automerge<'a, C: ?Sized, R: ?Sized, S = TokioSleeper> {
    client: &'a C,
    reporter: &'a R,
    engine: RetryEngine<S>,
    policy: RetryPolicy,
    cancel: Option<Cancellation>,
}

impl<'a, C, R> Automerge<'a, C, R, TokioSleeper>
where
    C: ChangeReviewClient + ?Sized,
    R: Reporter + ?Sized,
{
    pub fn new(client: &'a C, reporter: &'a R, policy: RetryPolicy) -> Self {
        Self::with_engine(client, reporter, policy, RetryEngine::default())
    }
}

impl<'a, C, R, S> Automerge<'a, C, R, S>
where
    C: ChangeReviewClient + ?Sized,
    R: Reporter + ?Sized,
    S: Sleeper,
{
    pub fn with_engine(
        client: &'a C,
        reporter: &'a R,
        policy: RetryPolicy,
        engine: RetryEngine<S>,
    ) -> Self {
        Self {
            client,
            reporter,
            engine,
            policy,
            cancel: None,
        }
    }

    pub fn with_cancellation(mut self, cancel: Cancellation) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Merge `change`, retrying transient failures.
    ///
    /// Returns `Ok(Skipped)` when the merge is pointless (already merged,
    /// draft, vanished, stale head) and `Err` only when the pipeline should fail.
    pub async fn run(&mut self, change: ChangeId) -> Result<MergeOutcome, ActionError> {
        let mut workflow = AutomergeWorkflow::new(self.client, change);
        if let Some(cancel) = &self.cancel {
            workflow = workflow.with_cancellation(cancel.clone());
        }
        let mut hooks = AutomergeHooks {
            reporter: self.reporter,
            change,
        };

        tracing::info!(%change, policy = ?self.policy, "attempting automerge");
        let result = self
            .engine
            .attempt(&self.policy, &mut workflow, &mut hooks)
            .await;

        match result {
            Ok(head_ref) => {
                tracing::info!(%change, %head_ref, "automerge succeeded");
                self.reporter
                    .notice(&format!("merged {} at {}", change, head_ref));
                Ok(MergeOutcome::Merged { head_ref })
            }
            Err(err) => self.settle(change, err),
        }
    }

    fn settle(
        &self,
        change: ChangeId,
        err: RetryError<StageFailure>,
    ) -> Result<MergeOutcome, ActionError> {
        if let Classification::Abort(reason) = classify_failure(err.error()) {
            tracing::info!(%change, %reason, "automerge skipped");
            self.reporter
                .notice(&format!("automerge of {} skipped: {}", change, reason));
            return Ok(MergeOutcome::Skipped(reason));
        }

        let elapsed = err.elapsed().as_secs();
        let attempts = err.attempts();
        let message = match &err {
            RetryError::LimitReached { error, .. } => format!(
                "fatal error at {}s: unable to merge {} after {} tries: {}",
                elapsed, change, attempts, error
            ),
            RetryError::Fatal { error, .. } | RetryError::Aborted { error, .. } => format!(
                "fatal error at {}s: automerge of {} failed on attempt #{}: {}",
                elapsed, change, attempts, error
            ),
        };
        tracing::error!(%change, attempts, elapsed_secs = elapsed, "{}", message);
        self.reporter.notice(&message);

        match err {
            RetryError::LimitReached { .. } => Err(ActionError::LimitExceeded(message)),
            _ => Err(ActionError::Fatal(message)),
        }
    }
}
