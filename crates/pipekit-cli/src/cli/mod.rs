//! CLI for the pipekit CI toolkit.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pipekit_core::config::{self, ToolkitConfig};
use pipekit_core::github::DEFAULT_API_URL;
use std::path::PathBuf;

use commands::{run_automerge, run_config, run_verify_install, AutomergeArgs, VerifyInstallArgs};

/// Top-level CLI for the pipekit CI toolkit.
#[derive(Debug, Parser)]
#[command(name = "pipekit")]
#[command(about = "pipekit: retrying CI actions (automerge, install verification)", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of ~/.config/pipekit/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Merge a pull request, retrying transient failures.
    Automerge {
        /// Pull request number.
        number: u64,

        /// Repository as `owner/name`.
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repo: String,

        /// Login of the actor that triggered the run; must be whitelisted.
        #[arg(long, env = "GITHUB_ACTOR")]
        actor: String,

        /// API token with permission to merge.
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// REST API base URL (GitHub Enterprise installs differ).
        #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,
    },

    /// Install a just-published package and smoke-test it.
    VerifyInstall {
        /// Package name.
        package: String,

        /// Published version.
        version: String,

        /// The package ships a CLI; also run `npx <package> --help`.
        #[arg(long)]
        has_bin: bool,

        /// The package is private (never published); nothing to verify.
        #[arg(long)]
        private: bool,

        /// CI was skipped for this run.
        #[arg(long)]
        skip_ci: bool,

        /// Release was skipped for this run.
        #[arg(long)]
        skip_cd: bool,
    },

    /// Print the resolved configuration.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> Result<ToolkitConfig> {
    match path {
        Some(path) => config::load_from_path(path),
        None => config::load_or_init(),
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = load_config(cli.config.as_ref())?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Automerge {
                number,
                repo,
                actor,
                token,
                api_url,
            } => {
                let args = AutomergeArgs {
                    number,
                    repo,
                    actor,
                    token,
                    api_url,
                };
                run_automerge(&cfg, args).await?;
            }
            CliCommand::VerifyInstall {
                package,
                version,
                has_bin,
                private,
                skip_ci,
                skip_cd,
            } => {
                let args = VerifyInstallArgs {
                    package,
                    version,
                    has_bin,
                    private,
                    skip_ci,
                    skip_cd,
                };
                run_verify_install(&cfg, args).await?;
            }
            CliCommand::Config => run_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
