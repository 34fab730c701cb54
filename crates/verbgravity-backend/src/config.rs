//! Configuration loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use verbgravity_core::model::GradingMode;

use crate::http::HttpBackend;

/// Top-level verbgravity configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerbGravityConfig {
    /// Base URL of the analysis/session API. Offline play when unset.
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// How the SUBJECT step is graded (`CORE` or `FULL`).
    #[serde(default)]
    pub grading_mode: GradingMode,
    /// Pause between a correct root and the subject step.
    #[serde(default = "default_advance_delay")]
    pub advance_delay_ms: u64,
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Where quiz reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_advance_delay() -> u64 {
    1000
}
fn default_timeout() -> u64 {
    30
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./verbgravity-results")
}

impl Default for VerbGravityConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            grading_mode: GradingMode::default(),
            advance_delay_ms: default_advance_delay(),
            request_timeout_secs: default_timeout(),
            output_dir: default_output_dir(),
        }
    }
}

impl VerbGravityConfig {
    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// An HTTP backend for `api_base_url`, or `None` when offline.
    pub fn backend(&self) -> Result<Option<HttpBackend>> {
        match &self.api_base_url {
            Some(url) if !url.trim().is_empty() => {
                Ok(Some(HttpBackend::new(url, self.request_timeout())?))
            }
            _ => Ok(None),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `verbgravity.toml` in the current directory
/// 2. `~/.config/verbgravity/config.toml`
///
/// Environment variable overrides: `VERBGRAVITY_API_URL`, `VERBGRAVITY_GRADING_MODE`.
pub fn load_config() -> Result<VerbGravityConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<VerbGravityConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("verbgravity.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config(&path)?
        }
        None => VerbGravityConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    Ok(config)
}

fn parse_config(path: &Path) -> Result<VerbGravityConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<VerbGravityConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn apply_env_overrides(config: &mut VerbGravityConfig) -> Result<()> {
    if let Ok(url) = std::env::var("VERBGRAVITY_API_URL") {
        config.api_base_url = Some(url);
    }

    if let Ok(mode) = std::env::var("VERBGRAVITY_GRADING_MODE") {
        config.grading_mode = mode
            .parse()
            .map_err(|e: String| anyhow::anyhow!("VERBGRAVITY_GRADING_MODE: {e}"))?;
    }

    config.api_base_url = config
        .api_base_url
        .as_deref()
        .map(resolve_env_vars)
        .filter(|url| !url.trim().is_empty());
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("verbgravity"))
}
