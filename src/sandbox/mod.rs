//! Script execution in a throwaway copy of a skill.
//!
//! Each run copies the whole bundle into a fresh temporary directory, writes
//! any caller files, builds a minimal environment, resolves an interpreter,
//! and waits for the child under a deadline. The copy is removed when the run
//! ends, however it ends.

pub mod launcher;
mod process;
mod request;
mod workspace;

use std::collections::BTreeMap;
use std::process::Command;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

pub use request::{InputFile, RunRequest};
pub use workspace::Workspace;

use crate::bundle::normalize_relative;
use crate::encoding::EncodedContent;
use crate::error::{Result, SkillzError};
use crate::registry::Skill;
use crate::resource::ensure_runnable;

/// Host variables passed through when set, in addition to `PATH`.
pub const FORWARDED_ENV: &[&str] = &["LANG", "LC_ALL", "PYTHONPATH"];

/// Timeout applied when the caller does not pass one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Result of a script that ran to completion (any exit code).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub command: Vec<String>,
    pub cwd: String,
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
    pub stdout: EncodedContent,
    pub stderr: EncodedContent,
    pub duration_seconds: f64,
}

impl ExecutionResult {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Convert caller-supplied seconds into a usable bound.
pub fn timeout_from_secs(seconds: f64) -> Result<Duration> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(SkillzError::Execution(format!(
            "Timeout must be a positive number of seconds, got {seconds}."
        )));
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|err| SkillzError::Execution(format!("Invalid timeout {seconds}: {err}")))
}

/// Minimal environment: `PATH`, the forwarded allowlist, then overrides.
#[must_use]
pub fn build_env(overrides: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();
    env.insert(
        "PATH".to_string(),
        std::env::var("PATH").unwrap_or_default(),
    );
    for key in FORWARDED_ENV {
        if let Ok(value) = std::env::var(key) {
            env.insert((*key).to_string(), value);
        }
    }
    env.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    env
}

/// Run the script at `rel` inside `skill` with `request`, bounded by `timeout`.
pub fn run_script(
    skill: &Skill,
    rel: &str,
    request: &RunRequest,
    timeout: Duration,
) -> Result<ExecutionResult> {
    if timeout.is_zero() {
        return Err(SkillzError::Execution("Timeout must be positive.".to_string()));
    }

    let script_rel = normalize_relative(rel)
        .filter(|path| !path.is_empty())
        .ok_or_else(|| SkillzError::Execution(format!("Script '{rel}' escapes the skill bundle.")))?;
    if !skill.source().contains(&script_rel) {
        return Err(SkillzError::Execution(format!(
            "Script '{rel}' not found for skill {}.",
            skill.slug()
        )));
    }
    ensure_runnable(skill, &script_rel)?;

    let stdin = request.stdin.as_ref().map(EncodedContent::decode).transpose()?;

    let workspace = Workspace::create(skill)?;
    for file in &request.files {
        workspace.write_file(file)?;
    }

    let script = workspace.resolve(&script_rel, "Script")?;
    let cwd = match &request.workdir {
        Some(dir) => workspace.resolve_dir(dir)?,
        None => script
            .parent()
            .map_or_else(|| workspace.root().to_path_buf(), std::path::Path::to_path_buf),
    };

    let mut argv = launcher::resolve_command(&script, &script_rel)?;
    argv.extend(request.args.iter().cloned());
    let env = build_env(&request.env);

    let mut command = Command::new(&argv[0]);
    command
        .args(&argv[1..])
        .current_dir(&cwd)
        .env_clear()
        .envs(&env);

    info!(
        slug = skill.slug(),
        script = %script_rel,
        command = ?argv,
        timeout_secs = timeout.as_secs_f64(),
        "Running skill script"
    );

    match process::run(command, stdin, timeout)? {
        process::Outcome::TimedOut => {
            warn!(slug = skill.slug(), script = %script_rel, "Script timed out");
            Err(SkillzError::Timeout {
                script: script_rel,
                seconds: timeout.as_secs_f64(),
            })
        }
        process::Outcome::Finished(done) => {
            info!(
                slug = skill.slug(),
                script = %script_rel,
                exit_code = ?done.status.code(),
                elapsed_ms = done.elapsed.as_millis(),
                "Script finished"
            );
            Ok(ExecutionResult {
                command: argv,
                cwd: cwd.display().to_string(),
                exit_code: done.status.code(),
                stdout: EncodedContent::from_bytes(done.stdout),
                stderr: EncodedContent::from_bytes(done.stderr),
                duration_seconds: done.elapsed.as_secs_f64(),
            })
        }
    }
}
