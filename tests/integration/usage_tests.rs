use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use skillz::registry::SkillRegistry;
use skillz::service::SkillService;
use skillz::test_utils::{SkillFixture, SkillSpec};
use skillz::usage::{UsageLogConfig, UsageLogger};

fn read_events(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn service_with_log(fixture: &SkillFixture, config: UsageLogConfig) -> SkillService {
    let registry = Arc::new(SkillRegistry::load(fixture.root()).unwrap());
    let logger = UsageLogger::new(config, Some(registry.root()));
    SkillService::new(registry).with_usage_logger(Arc::new(logger))
}

#[test]
fn default_log_lives_beside_skills_root() {
    let fixture = SkillFixture::new();
    fixture.write_dir(&SkillSpec::new("Echo", "Test skill").file("notes.txt", "hi"));
    let service = service_with_log(&fixture, UsageLogConfig::default());

    service.invoke_skill("echo", "say hi").unwrap();

    let log = fixture.temp_dir.path().join("logs").join("skill_usage.jsonl");
    let events = read_events(&log);
    let kinds: Vec<&str> = events.iter().map(|e| e["event"].as_str().unwrap()).collect();
    assert_eq!(kinds, ["skill_invoked", "skill_read", "skill_complete"]);
    assert_eq!(events[0]["skill"], "echo");
    assert_eq!(events[0]["task"], "say hi");
    assert_eq!(events[0]["metadata"]["resource_count"], 1);
    let session = events[0]["session_id"].as_str().unwrap();
    assert_eq!(session.len(), 16);
    assert!(events.iter().all(|e| e["session_id"] == session));
}

#[test]
fn event_toggles_are_respected() {
    let fixture = SkillFixture::new();
    fixture.write_dir(&SkillSpec::new("Echo", "Test skill").file("notes.txt", "hi"));
    let log = fixture.temp_dir.path().join("custom.jsonl");
    let mut config = UsageLogConfig {
        file_path: Some(log.clone()),
        ..UsageLogConfig::default()
    };
    config.events.insert("skill_invoked".to_string(), false);
    let service = service_with_log(&fixture, config);

    service.invoke_skill("echo", "task").unwrap();
    service.read_resource("resource://skillz/echo/notes.txt").unwrap();

    let events = read_events(&log);
    let kinds: Vec<&str> = events.iter().map(|e| e["event"].as_str().unwrap()).collect();
    assert_eq!(kinds, ["skill_read", "resource_fetched"]);
    assert_eq!(events[1]["resource_uri"], "resource://skillz/echo/notes.txt");
}

#[cfg(unix)]
#[test]
fn script_runs_are_logged_with_exit_code() {
    let fixture = SkillFixture::new();
    fixture.write_dir(&SkillSpec::new("Exit", "Exits").script("fail.sh", "#!/bin/sh\nexit 3\n"));
    let log = fixture.temp_dir.path().join("usage.jsonl");
    let service = service_with_log(
        &fixture,
        UsageLogConfig {
            file_path: Some(log.clone()),
            ..UsageLogConfig::default()
        },
    );

    let result = service
        .run_script("exit", "fail.sh", &skillz::sandbox::RunRequest::new(), None)
        .unwrap();
    assert_eq!(result.exit_code, Some(3));

    let events = read_events(&log);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event"], "script_executed");
    assert_eq!(events[0]["script"], "fail.sh");
    assert_eq!(events[0]["exit_code"], 3);
    assert!(events[0]["duration_ms"].is_u64());
}

#[test]
fn disabled_logging_writes_nothing() {
    let fixture = SkillFixture::new();
    fixture.write_dir(&SkillSpec::new("Echo", "Test skill"));
    let log = fixture.temp_dir.path().join("never.jsonl");
    let service = service_with_log(
        &fixture,
        UsageLogConfig {
            file_path: Some(log.clone()),
            ..UsageLogConfig::disabled()
        },
    );

    service.invoke_skill("echo", "task").unwrap();
    service.get_skill_metadata("echo").unwrap();

    assert!(!log.exists());
}
