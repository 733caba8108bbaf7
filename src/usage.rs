//! Append-only JSONL log of skill usage events.
//!
//! Each line is one JSON object carrying `timestamp`, `session_id`, `event`
//! and event-specific fields. Failures to write are logged and swallowed:
//! the usage log never affects a request's outcome.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};
use tracing::{info, warn};

/// Longest task description kept in a log entry, in characters.
const MAX_TASK_CHARS: usize = 200;

pub const SKILL_INVOKED: &str = "skill_invoked";
pub const SKILL_READ: &str = "skill_read";
pub const RESOURCE_FETCHED: &str = "resource_fetched";
pub const SCRIPT_EXECUTED: &str = "script_executed";
const SKILL_COMPLETE: &str = "skill_complete";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UsageLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UsageOutput {
    #[default]
    File,
    Stderr,
    Both,
}

impl UsageOutput {
    const fn to_file(self) -> bool {
        matches!(self, Self::File | Self::Both)
    }

    const fn to_stderr(self) -> bool {
        matches!(self, Self::Stderr | Self::Both)
    }
}

fn default_events() -> BTreeMap<String, bool> {
    [SKILL_INVOKED, SKILL_READ, RESOURCE_FETCHED, SCRIPT_EXECUTED]
        .into_iter()
        .map(|event| (event.to_string(), true))
        .collect()
}

/// The `logging` section of `.skillz-config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageLogConfig {
    pub enabled: bool,
    pub level: UsageLevel,
    pub output: UsageOutput,
    pub file_path: Option<PathBuf>,
    /// Listed toggles override the defaults; unlisted events keep theirs.
    #[serde(deserialize_with = "events_over_defaults")]
    pub events: BTreeMap<String, bool>,
}

fn events_over_defaults<'de, D>(deserializer: D) -> Result<BTreeMap<String, bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut events = default_events();
    events.extend(BTreeMap::<String, bool>::deserialize(deserializer)?);
    Ok(events)
}

impl Default for UsageLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: UsageLevel::default(),
            output: UsageOutput::default(),
            file_path: None,
            events: default_events(),
        }
    }
}

impl UsageLogConfig {
    /// Event kinds not listed are off.
    #[must_use]
    pub fn should_log_event(&self, event: &str) -> bool {
        self.enabled
            && self.level != UsageLevel::Off
            && self.events.get(event).copied().unwrap_or(false)
    }

    /// Config with every event switched off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Writer for the usage log.
#[derive(Debug)]
pub struct UsageLogger {
    config: UsageLogConfig,
    log_file: Option<PathBuf>,
    write_lock: Mutex<()>,
}

impl UsageLogger {
    /// Build a logger, resolving and creating the log file location.
    #[must_use]
    pub fn new(config: UsageLogConfig, skills_root: Option<&Path>) -> Self {
        let log_file = resolve_log_file(&config, skills_root);
        if config.enabled && config.level != UsageLevel::Off {
            info!(
                level = ?config.level,
                output = ?config.output,
                file = ?log_file,
                "Skill usage logging initialized"
            );
        }
        Self {
            config,
            log_file,
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &UsageLogConfig {
        &self.config
    }

    #[must_use]
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Record a skill invocation and return the session id for follow-up events.
    pub fn skill_invoked(&self, skill: &str, task: &str, metadata: Option<Value>) -> String {
        let session_id = new_session_id();
        if self.config.should_log_event(SKILL_INVOKED) {
            self.write(&session_id, SKILL_INVOKED, json!({
                "skill": skill,
                "task": truncate_task(task),
                "metadata": metadata.unwrap_or_else(|| json!({})),
            }));
        }
        session_id
    }

    pub fn skill_read(&self, skill: &str, reader: &str, session_id: Option<&str>) {
        if self.config.should_log_event(SKILL_READ) {
            let session_id = session_id.map_or_else(new_session_id, str::to_string);
            self.write(&session_id, SKILL_READ, json!({ "skill": skill, "reader": reader }));
        }
    }

    pub fn resource_fetched(&self, skill: &str, resource_uri: &str, session_id: Option<&str>) {
        if self.config.should_log_event(RESOURCE_FETCHED) {
            let session_id = session_id.map_or_else(new_session_id, str::to_string);
            self.write(&session_id, RESOURCE_FETCHED, json!({
                "skill": skill,
                "resource_uri": resource_uri,
            }));
        }
    }

    pub fn script_executed(&self, skill: &str, script: &str, exit_code: Option<i32>, duration_ms: u64) {
        if self.config.should_log_event(SCRIPT_EXECUTED) {
            self.write(&new_session_id(), SCRIPT_EXECUTED, json!({
                "skill": skill,
                "script": script,
                "exit_code": exit_code,
                "duration_ms": duration_ms,
            }));
        }
    }

    /// Close out an invocation; shares the `skill_invoked` toggle.
    pub fn skill_complete(
        &self,
        session_id: &str,
        skill: &str,
        status: &str,
        duration_ms: Option<u64>,
        result: Option<Value>,
    ) {
        if !self.config.should_log_event(SKILL_INVOKED) {
            return;
        }
        let mut fields = json!({ "skill": skill, "status": status });
        if let Some(duration_ms) = duration_ms {
            fields["duration_ms"] = json!(duration_ms);
        }
        if let Some(result) = result.filter(|r| !r.is_null()) {
            fields["result"] = result;
        }
        self.write(session_id, SKILL_COMPLETE, fields);
    }

    fn write(&self, session_id: &str, event: &str, fields: Value) {
        let mut entry = Map::new();
        entry.insert("timestamp".into(), json!(Utc::now().to_rfc3339()));
        entry.insert("session_id".into(), json!(session_id));
        entry.insert("event".into(), json!(event));
        if let Value::Object(fields) = fields {
            entry.extend(fields);
        }
        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(err) => {
                warn!(error = %err, "Failed to serialize usage entry");
                return;
            }
        };

        let _guard = self.write_lock.lock();
        if self.config.output.to_file() {
            if let Some(path) = &self.log_file {
                let written = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .and_then(|mut file| writeln!(file, "{line}"));
                if let Err(err) = written {
                    warn!(path = %path.display(), error = %err, "Failed to write usage log");
                }
            }
        }
        if self.config.output.to_stderr() {
            eprintln!("{line}");
        }
    }
}

fn resolve_log_file(config: &UsageLogConfig, skills_root: Option<&Path>) -> Option<PathBuf> {
    if !config.output.to_file() {
        return None;
    }
    let path = config.file_path.clone().unwrap_or_else(|| {
        skills_root
            .and_then(Path::parent)
            .map_or_else(
                || std::env::temp_dir().join("skillz_usage.jsonl"),
                |parent| parent.join("logs").join("skill_usage.jsonl"),
            )
    });
    if let Some(parent) = path.parent() {
        if let Err(err) = std::fs::create_dir_all(parent) {
            warn!(path = %parent.display(), error = %err, "Failed to create usage log directory");
            return None;
        }
    }
    Some(path)
}

/// 16 lowercase hex characters.
fn new_session_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}

fn truncate_task(task: &str) -> String {
    if task.chars().count() <= MAX_TASK_CHARS {
        return task.to_string();
    }
    let kept: String = task.chars().take(MAX_TASK_CHARS - 3).collect();
    format!("{kept}...")
}
