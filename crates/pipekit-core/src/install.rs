//! Post-release install verification.
//!
//! Installs a freshly published package from the registry, retrying until
//! the registry has caught up or the elapsed ceiling is reached, then runs
//! a couple of smoke checks against the installed copy. Single stage: every
//! install failure is transient until the ceiling.

use crate::command::{CommandError, CommandOutput, CommandRunner, CommandSpec};
use crate::control::{Cancellation, Cancelled};
use crate::error::ActionError;
use crate::report::Reporter;
use crate::retry::{
    FailedAttempt, LimitReached, RetryEngine, RetryError, RetryHooks, RetryPolicy, Sleeper,
    Verdict,
};
use std::time::Duration;

/// What to install and how the pipeline classified this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallRequest {
    pub package: String,
    pub version: String,
    /// Package declares a `bin` entry; also check `npx <pkg> --help`.
    pub has_bin: bool,
    /// Private packages are never published, so there is nothing to verify.
    pub private: bool,
    pub skip_ci: bool,
    pub skip_cd: bool,
}

impl InstallRequest {
    pub fn new(package: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            version: version.into(),
            has_bin: false,
            private: false,
            skip_ci: false,
            skip_cd: false,
        }
    }

    fn target(&self) -> String {
        format!("{}@{}", self.package, self.version)
    }

    fn should_skip(&self) -> bool {
        self.skip_ci || self.skip_cd || self.private
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Verified { attempts: u32 },
    Skipped,
}

/// Why one install attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum InstallFailure {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Retry policy for install verification with the given elapsed ceiling.
pub fn install_policy(ceiling: Duration) -> RetryPolicy {
    RetryPolicy::long_running(ceiling)
}

struct InstallHooks<'r, R: ?Sized> {
    reporter: &'r R,
    target: String,
    failures: u32,
}

impl<R: Reporter + ?Sized> RetryHooks<InstallFailure> for InstallHooks<'_, R> {
    fn on_failure(&mut self, failure: &FailedAttempt<'_, InstallFailure>) -> Verdict {
        self.failures += 1;
        if let InstallFailure::Cancelled(_) = failure.error {
            return Verdict::Fatal;
        }
        self.reporter.notice(&format!(
            "transient failure at {}s: attempt #{} installing {} did not succeed: {}\n---\n\
             next attempt in {} seconds...",
            failure.elapsed.as_secs(),
            failure.attempt,
            self.target,
            failure.error,
            failure.next_delay.as_secs(),
        ));
        Verdict::Retry
    }

    fn on_limit_reached(&mut self, limit: &LimitReached<'_, InstallFailure>) {
        tracing::warn!(
            package = %self.target,
            attempts = limit.attempt,
            reason = limit.reason.as_str(),
            "install retry limit reached"
        );
    }
}

async fn run_install<C>(
    runner: &C,
    install: &CommandSpec,
    cancel: Option<&Cancellation>,
) -> Result<CommandOutput, InstallFailure>
where
    C: CommandRunner + ?Sized,
{
    let Some(cancel) = cancel else {
        return Ok(runner.run(install).await?);
    };
    cancel.check()?;
    tokio::select! {
        output = runner.run(install) => Ok(output?),
        _ = cancel.cancelled() => Err(Cancelled.into()),
    }
}

/// Install `request` with retries, then smoke-test the installed package.
///
/// With a `cancel` token, each attempt checks it first and a running
/// install is abandoned (and its process killed) once it fires.
pub async fn verify_install<C, R, S>(
    runner: &C,
    reporter: &R,
    engine: &mut RetryEngine<S>,
    policy: &RetryPolicy,
    request: &InstallRequest,
    cancel: Option<&Cancellation>,
) -> Result<InstallOutcome, ActionError>
where
    C: CommandRunner + ?Sized,
    R: Reporter + ?Sized,
    S: Sleeper,
{
    let target = request.target();
    if request.should_skip() {
        tracing::debug!(package = %target, "skipped install verification");
        return Ok(InstallOutcome::Skipped);
    }

    tracing::debug!(package = %target, "attempting to install");
    let install = CommandSpec::new("npm")
        .arg("install")
        .arg(target.clone())
        .env("NODE_ENV", "production");
    let install = &install;
    let mut op = move || run_install(runner, install, cancel);
    let mut hooks = InstallHooks {
        reporter,
        target: target.clone(),
        failures: 0,
    };

    let attempts = match engine.attempt(policy, &mut op, &mut hooks).await {
        Ok(_) => hooks.failures + 1,
        Err(err) => {
            let message = match &err {
                RetryError::LimitReached { error, attempts, elapsed, .. } => format!(
                    "fatal error at {}s: unable to install {} after {} tries: {}",
                    elapsed.as_secs(),
                    target,
                    attempts,
                    error
                ),
                other => format!(
                    "fatal error at {}s: unable to install {} on attempt #{}: {}",
                    other.elapsed().as_secs(),
                    target,
                    other.attempts(),
                    other.error()
                ),
            };
            reporter.notice(&message);
            return Err(ActionError::Fatal(message));
        }
    };

    runner
        .run(&CommandSpec::new("node").args([
            "-e".to_string(),
            format!("const test = require('{}');", request.package),
        ]))
        .await
        .map_err(|e| ActionError::fatal(format!("generic execution test failed: {}", e)))?;

    if request.has_bin {
        runner
            .run(&CommandSpec::new("npx").args([
                "--no-install",
                request.package.as_str(),
                "--help",
            ]))
            .await
            .map_err(|e| ActionError::fatal(format!("npx cli test failed: {}", e)))?;
    }

    tracing::info!(package = %target, attempts, "install verified");
    Ok(InstallOutcome::Verified { attempts })
}
