use crate::retry::{AttemptLimit, RetryPolicy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Retry policy parameters (optional sections in config.toml).
///
/// Zero means "no limit" for `max_attempts` and `max_delay_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first); 0 = unbounded.
    #[serde(default)]
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each attempt after that.
    pub min_delay_ms: u64,
    /// Cap on the backoff delay before jitter; 0 = uncapped.
    #[serde(default)]
    pub max_delay_ms: u64,
    /// Upper bound of the random delay added to every backoff.
    #[serde(default)]
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            min_delay_ms: 10_000,
            max_delay_ms: 30_000,
            max_jitter_ms: 5_000,
        }
    }
}

impl RetryConfig {
    /// Policy for these parameters, bounded by the elapsed `ceiling`.
    pub fn to_policy(&self, ceiling: Duration) -> RetryPolicy {
        let mut policy = RetryPolicy::default()
            .with_max_attempts(AttemptLimit::from_count(self.max_attempts))
            .with_max_total_elapsed(ceiling)
            .with_min_delay(Duration::from_millis(self.min_delay_ms))
            .with_max_jitter(Duration::from_millis(self.max_jitter_ms));
        policy.max_delay = match self.max_delay_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };
        policy
    }
}

/// Global configuration loaded from `~/.config/pipekit/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolkitConfig {
    /// Elapsed-time ceiling for automerge and install retries, in seconds.
    pub retry_ceiling_seconds: u64,
    /// When false, automerge gets exactly one attempt.
    pub can_retry_automerge: bool,
    /// Actors (login names) allowed to trigger automerge.
    pub automerge_actor_whitelist: Vec<String>,
    /// Optional automerge retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub automerge_retry: Option<RetryConfig>,
    /// Optional install-verification retry policy.
    #[serde(default)]
    pub install_retry: Option<RetryConfig>,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            retry_ceiling_seconds: 900,
            can_retry_automerge: true,
            automerge_actor_whitelist: vec!["dependabot[bot]".to_string()],
            automerge_retry: None,
            install_retry: None,
        }
    }
}

impl ToolkitConfig {
    pub fn retry_ceiling(&self) -> Duration {
        Duration::from_secs(self.retry_ceiling_seconds)
    }

    /// Exact, case-sensitive match against the whitelist.
    pub fn can_automerge(&self, actor: &str) -> bool {
        self.automerge_actor_whitelist.iter().any(|a| a == actor)
    }

    pub fn automerge_policy(&self) -> RetryPolicy {
        if !self.can_retry_automerge {
            return RetryPolicy::single_attempt();
        }
        match &self.automerge_retry {
            Some(retry) => retry.to_policy(self.retry_ceiling()),
            None => RetryPolicy::long_running(self.retry_ceiling()),
        }
    }

    pub fn install_policy(&self) -> RetryPolicy {
        match &self.install_retry {
            Some(retry) => retry.to_policy(self.retry_ceiling()),
            None => crate::install::install_policy(self.retry_ceiling()),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pipekit")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ToolkitConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ToolkitConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<ToolkitConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: ToolkitConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = ToolkitConfig::default();
        assert_eq!(cfg.retry_ceiling_seconds, 900);
        assert!(cfg.can_retry_automerge);
        assert!(cfg.can_automerge("dependabot[bot]"));
        assert!(!cfg.can_automerge("Dependabot[bot]"));
        assert!(!cfg.can_automerge("octocat"));
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = ToolkitConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ToolkitConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_retry_sections() {
        let toml = r#"
            retry_ceiling_seconds = 120
            can_retry_automerge = true
            automerge_actor_whitelist = ["dependabot[bot]", "renovate[bot]"]

            [automerge_retry]
            max_attempts = 3
            min_delay_ms = 500
            max_delay_ms = 0
            max_jitter_ms = 0

            [install_retry]
            min_delay_ms = 2000
        "#;
        let cfg: ToolkitConfig = toml::from_str(toml).unwrap();
        assert!(cfg.can_automerge("renovate[bot]"));

        let merge = cfg.automerge_policy();
        assert_eq!(merge.max_attempts, AttemptLimit::Max(3));
        assert_eq!(merge.max_total_elapsed, Some(Duration::from_secs(120)));
        assert_eq!(merge.min_delay, Duration::from_millis(500));
        assert_eq!(merge.max_delay, None);
        assert_eq!(merge.max_jitter, Duration::ZERO);

        let install = cfg.install_policy();
        assert_eq!(install.max_attempts, AttemptLimit::Unbounded);
        assert_eq!(install.min_delay, Duration::from_secs(2));
        assert_eq!(install.max_delay, None);
    }

    #[test]
    fn default_policies_are_long_running() {
        let cfg = ToolkitConfig::default();
        let policy = cfg.automerge_policy();
        assert_eq!(policy.max_attempts, AttemptLimit::Unbounded);
        assert_eq!(policy.max_total_elapsed, Some(Duration::from_secs(900)));
        assert_eq!(policy.min_delay, Duration::from_secs(10));
        assert_eq!(policy.max_delay, Some(Duration::from_secs(30)));
        assert_eq!(policy.max_jitter, Duration::from_secs(5));
        assert_eq!(cfg.install_policy(), policy);
    }

    #[test]
    fn disabled_automerge_retry_is_single_attempt() {
        let cfg = ToolkitConfig {
            can_retry_automerge: false,
            ..ToolkitConfig::default()
        };
        assert_eq!(cfg.automerge_policy().max_attempts, AttemptLimit::Max(1));
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "retry_ceiling_seconds = 30\ncan_retry_automerge = false\nautomerge_actor_whitelist = []\n",
        )
        .unwrap();
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.retry_ceiling(), Duration::from_secs(30));
        assert!(!cfg.can_automerge("dependabot[bot]"));
    }

    #[test]
    fn load_from_path_reports_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "retry_ceiling_seconds = \"soon\"").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("parsing config"));
    }
}
