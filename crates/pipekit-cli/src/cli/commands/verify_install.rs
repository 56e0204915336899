//! `pipekit verify-install` – install a published package and smoke-test it.

use anyhow::Result;
use pipekit_core::command::TokioCommandRunner;
use pipekit_core::config::ToolkitConfig;
use pipekit_core::install::{verify_install, InstallOutcome, InstallRequest};
use pipekit_core::report::ConsoleReporter;
use pipekit_core::retry::{CancellableSleeper, RetryEngine};

use super::cancel_on_interrupt;

#[derive(Debug)]
pub struct VerifyInstallArgs {
    pub package: String,
    pub version: String,
    pub has_bin: bool,
    pub private: bool,
    pub skip_ci: bool,
    pub skip_cd: bool,
}

impl From<VerifyInstallArgs> for InstallRequest {
    fn from(args: VerifyInstallArgs) -> Self {
        InstallRequest {
            package: args.package,
            version: args.version,
            has_bin: args.has_bin,
            private: args.private,
            skip_ci: args.skip_ci,
            skip_cd: args.skip_cd,
        }
    }
}

pub async fn run_verify_install(cfg: &ToolkitConfig, args: VerifyInstallArgs) -> Result<()> {
    let request = InstallRequest::from(args);
    let cancel = cancel_on_interrupt();
    let mut engine = RetryEngine::new(CancellableSleeper::new(cancel.clone()));

    let outcome = verify_install(
        &TokioCommandRunner,
        &ConsoleReporter,
        &mut engine,
        &cfg.install_policy(),
        &request,
        Some(&cancel),
    )
    .await?;

    match outcome {
        InstallOutcome::Verified { attempts } => println!(
            "verified {}@{} after {} attempt(s)",
            request.package, request.version, attempts
        ),
        InstallOutcome::Skipped => println!(
            "skipped install verification for {}@{}",
            request.package, request.version
        ),
    }
    Ok(())
}
