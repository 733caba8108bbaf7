use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SkillzError};
use crate::usage::{UsageLevel, UsageLogConfig, UsageOutput};

/// Per-root config file, looked up inside the skills root.
pub const ROOT_CONFIG_FILE: &str = ".skillz-config.json";

const DEFAULT_TIMEOUT_SECS: f64 = 60.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: UsageLogConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl Config {
    /// Layer defaults, `$SKILLZ_CONFIG`, the root's config file, `explicit_path`,
    /// then environment overrides.
    pub fn load(explicit_path: Option<&Path>, skills_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = env_string("SKILLZ_CONFIG").map(PathBuf::from) {
            config.merge_implicit(&path);
        }
        config.merge_implicit(&skills_root.join(ROOT_CONFIG_FILE));

        if let Some(path) = explicit_path {
            if !path.exists() {
                return Err(SkillzError::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            if let Some(patch) = Self::load_patch(path)? {
                config.merge_patch(patch);
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Implicit locations are best effort: a broken file is skipped.
    fn merge_implicit(&mut self, path: &Path) {
        match Self::load_patch(path) {
            Ok(Some(patch)) => self.merge_patch(patch),
            Ok(None) => {}
            Err(err) => warn!(path = %path.display(), error = %err, "Ignoring config file"),
        }
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| SkillzError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = serde_json::from_str(&raw)
            .map_err(|err| SkillzError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.logging {
            merge_logging(&mut self.logging, patch);
        }
        if let Some(patch) = patch.execution {
            self.execution.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(value) = env_f64("SKILLZ_TIMEOUT")? {
            self.execution.timeout_secs = value;
        }
        if let Some(value) = env_bool("SKILLZ_USAGE_LOG") {
            self.logging.enabled = value;
        }
        if let Some(value) = env_string("SKILLZ_USAGE_LOG_FILE") {
            self.logging.file_path = Some(expand_tilde(&value));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Default script timeout when a call does not pass one.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ExecutionConfig {
    fn merge(&mut self, patch: ExecutionPatch) {
        if let Some(value) = patch.timeout_secs {
            self.timeout_secs = value;
        }
    }
}

const fn default_timeout_secs() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

fn merge_logging(config: &mut UsageLogConfig, patch: LoggingPatch) {
    if let Some(value) = patch.enabled {
        config.enabled = value;
    }
    if let Some(value) = patch.level {
        config.level = value;
    }
    if let Some(value) = patch.output {
        config.output = value;
    }
    if let Some(value) = patch.file_path {
        config.file_path = Some(expand_tilde(&value));
    }
    if let Some(events) = patch.events {
        config.events.extend(events);
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    logging: Option<LoggingPatch>,
    execution: Option<ExecutionPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    enabled: Option<bool>,
    level: Option<UsageLevel>,
    output: Option<UsageOutput>,
    file_path: Option<String>,
    events: Option<std::collections::BTreeMap<String, bool>>,
}

#[derive(Debug, Default, Deserialize)]
struct ExecutionPatch {
    timeout_secs: Option<f64>,
}

/// Skills root: explicit flag, then `$SKILLZ_ROOT`, then `~/.skillz`.
#[must_use]
pub fn resolve_skills_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return expand_tilde(&path.to_string_lossy());
    }
    if let Some(value) = env_string("SKILLZ_ROOT") {
        return expand_tilde(&value);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".skillz")
}

/// Expand a leading `~` or `~/` to the home directory.
#[must_use]
pub fn expand_tilde(raw: &str) -> PathBuf {
    let home = || dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    if raw == "~" {
        return home();
    }
    match raw.strip_prefix("~/") {
        Some(rest) => home().join(rest),
        None => PathBuf::from(raw),
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|value| {
        matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_f64(key: &str) -> Result<Option<f64>> {
    match env_string(key) {
        Some(value) => value.trim().parse::<f64>().map(Some).map_err(|err| {
            SkillzError::Config(format!("invalid {key} value {value}: {err}"))
        }),
        None => Ok(None),
    }
}
