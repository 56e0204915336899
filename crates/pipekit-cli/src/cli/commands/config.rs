//! `pipekit config` – print the resolved configuration.

use anyhow::Result;
use pipekit_core::config::{self, ToolkitConfig};

pub fn run_config(cfg: &ToolkitConfig) -> Result<()> {
    if let Ok(path) = config::config_path() {
        println!("# {}", path.display());
    }
    print!("{}", toml::to_string_pretty(cfg)?);
    println!("# automerge policy: {:?}", cfg.automerge_policy());
    println!("# install policy: {:?}", cfg.install_policy());
    Ok(())
}
