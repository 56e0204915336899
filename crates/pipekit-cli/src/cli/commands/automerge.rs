//! `pipekit automerge` – merge a pull request with retries.

use anyhow::Result;
use pipekit_core::automerge::{Automerge, ChangeId, MergeOutcome};
use pipekit_core::config::ToolkitConfig;
use pipekit_core::error::ActionError;
use pipekit_core::github::GithubClient;
use pipekit_core::report::{ConsoleReporter, Reporter};
use pipekit_core::retry::{CancellableSleeper, RetryEngine};

use super::cancel_on_interrupt;

#[derive(Debug)]
pub struct AutomergeArgs {
    pub number: u64,
    pub repo: String,
    pub actor: String,
    pub token: Option<String>,
    pub api_url: String,
}

pub async fn run_automerge(cfg: &ToolkitConfig, args: AutomergeArgs) -> Result<()> {
    let reporter = ConsoleReporter;
    let change = ChangeId(args.number);

    if !cfg.can_automerge(&args.actor) {
        reporter.notice(&format!(
            "automerge of {} skipped: actor {} is not whitelisted",
            change, args.actor
        ));
        return Ok(());
    }

    let token = args.token.ok_or(ActionError::MissingOption("token"))?;
    let client = GithubClient::new(args.repo, token).with_api_url(args.api_url);

    let cancel = cancel_on_interrupt();
    let engine = RetryEngine::new(CancellableSleeper::new(cancel.clone()));
    let mut automerge = Automerge::with_engine(&client, &reporter, cfg.automerge_policy(), engine)
        .with_cancellation(cancel);

    match automerge.run(change).await? {
        MergeOutcome::Merged { head_ref } => {
            tracing::info!(%change, %head_ref, "automerge finished");
        }
        MergeOutcome::Skipped(reason) => {
            tracing::info!(%change, %reason, "automerge finished without merging");
        }
    }
    Ok(())
}
