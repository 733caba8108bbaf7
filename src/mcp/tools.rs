//! Tool definitions and handlers.

use serde::Serialize;
use serde_json::{Value, json};

use super::protocol::{Tool, ToolResult};
use crate::error::{Result, SkillzError};
use crate::sandbox::{RunRequest, timeout_from_secs};
use crate::service::SkillService;

pub fn define_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "list_skills".into(),
            description: "List every registered skill with its metadata and resource URIs".into(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        Tool {
            name: "get_skill".into(),
            description: "Get a skill. With a task, returns its instructions and resources for that task".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "slug": {
                        "type": "string",
                        "description": "Skill slug"
                    },
                    "task": {
                        "type": "string",
                        "description": "What you want to accomplish with the skill"
                    }
                },
                "required": ["slug"]
            }),
        },
        Tool {
            name: "fetch_resource".into(),
            description: "Read a skill resource by URI (resource://skillz/<slug>/<path>)".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "resource_uri": {
                        "type": "string",
                        "description": "Resource URI"
                    }
                },
                "required": ["resource_uri"]
            }),
        },
        Tool {
            name: "run_script".into(),
            description: "Run a script bundled with a skill in a temporary copy of the skill".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "slug": {
                        "type": "string",
                        "description": "Skill slug"
                    },
                    "path": {
                        "type": "string",
                        "description": "Script path relative to the skill root"
                    },
                    "args": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Command-line arguments"
                    },
                    "stdin": {
                        "description": "Text, or {content, encoding} with encoding utf-8 or base64"
                    },
                    "env": {
                        "type": "object",
                        "additionalProperties": {"type": "string"},
                        "description": "Extra environment variables"
                    },
                    "files": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "path": {"type": "string"},
                                "content": {"type": "string"},
                                "encoding": {"type": "string"}
                            },
                            "required": ["path", "content"]
                        },
                        "description": "Files written into the workspace before running"
                    },
                    "workdir": {
                        "type": "string",
                        "description": "Working directory relative to the skill root"
                    },
                    "timeout": {
                        "type": "number",
                        "description": "Timeout in seconds"
                    }
                },
                "required": ["slug", "path"]
            }),
        },
    ]
}

/// One tool per registered skill, named by slug and described by the skill.
///
/// Slugs never contain `_`, so they cannot shadow the fixed tool names.
pub fn skill_tools(service: &SkillService) -> Vec<Tool> {
    service
        .registry()
        .skills()
        .iter()
        .map(|skill| Tool {
            name: skill.slug().to_string(),
            description: format!(
                "[SKILL] {} - {} Invoke with a task to receive the skill's instructions and resources.",
                skill.name(),
                skill.metadata().description
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task": {
                        "type": "string",
                        "description": "What you want to accomplish with this skill"
                    }
                },
                "required": ["task"]
            }),
        })
        .collect()
}

/// Run the tool `name`; failures become `isError` results.
pub fn call_tool(service: &SkillService, name: &str, args: &Value) -> ToolResult {
    let result = match name {
        "list_skills" => json_text(&service.list_skills()),
        "get_skill" => handle_get_skill(service, args),
        "fetch_resource" => handle_fetch_resource(service, args),
        "run_script" => handle_run_script(service, args),
        slug if service.registry().find(slug).is_some() => {
            required_str(args, "task").and_then(|task| json_text(&service.invoke_skill(slug, task)?))
        }
        _ => Err(SkillzError::Validation(format!("Unknown tool: {name}"))),
    };
    result.unwrap_or_else(|err| ToolResult::error(err.to_string()))
}

fn handle_get_skill(service: &SkillService, args: &Value) -> Result<ToolResult> {
    let slug = required_str(args, "slug")?;
    match args.get("task").and_then(Value::as_str) {
        Some(task) => json_text(&service.invoke_skill(slug, task)?),
        None => json_text(&service.get_skill_metadata(slug)?),
    }
}

fn handle_fetch_resource(service: &SkillService, args: &Value) -> Result<ToolResult> {
    let uri = required_str(args, "resource_uri")?;
    match service.read_resource(uri) {
        Ok(content) => json_text(&content),
        Err(miss) => json_text(&miss.to_payload(uri)),
    }
}

fn handle_run_script(service: &SkillService, args: &Value) -> Result<ToolResult> {
    let slug = required_str(args, "slug")?;
    let path = required_str(args, "path")?;
    let request = RunRequest::from_json(Some(args))?;
    let timeout = match args.get("timeout").filter(|v| !v.is_null()) {
        Some(value) => {
            let seconds = value.as_f64().ok_or_else(|| {
                SkillzError::Execution("'timeout' must be a number of seconds.".to_string())
            })?;
            Some(timeout_from_secs(seconds)?)
        }
        None => None,
    };
    json_text(&service.run_script(slug, path, &request, timeout)?)
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| SkillzError::Validation(format!("Missing required parameter: {key}")))
}

fn json_text<T: Serialize>(value: &T) -> Result<ToolResult> {
    Ok(ToolResult::text(serde_json::to_string_pretty(value)?))
}
