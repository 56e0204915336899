//! CLI command handlers. Each command is in its own file.

mod automerge;
mod config;
mod verify_install;

pub use automerge::{run_automerge, AutomergeArgs};
pub use config::run_config;
pub use verify_install::{run_verify_install, VerifyInstallArgs};

use pipekit_core::control::Cancellation;

/// Cancellation that fires on Ctrl-C / SIGINT, so a long retry wait stops promptly.
fn cancel_on_interrupt() -> Cancellation {
    let cancel = Cancellation::new();
    let handle = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling");
            handle.cancel();
        }
    });
    cancel
}
