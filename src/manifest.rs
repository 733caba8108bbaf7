//! SKILL.md parsing.
//!
//! A manifest is a YAML front matter block delimited by `---` lines followed
//! by a Markdown body:
//!
//! ```text
//! ---
//! name: Echo
//! description: Repeat things back
//! allowed-tools: Bash, Read
//! ---
//! # Echo
//! ...
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use serde_yaml::Value as Yaml;

use crate::error::{Result, SkillzError};

static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\A---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n|\z)(.*)\z")
        .expect("front matter regex is valid")
});

/// Header keys with dedicated fields; everything else lands in `extra`.
const RECOGNIZED_KEYS: &[&str] = &["name", "description", "license", "allowed-tools", "allowed_tools"];

/// Parsed front matter of a skill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillMetadata {
    pub name: String,
    pub description: String,
    pub license: Option<String>,
    pub allowed_tools: Vec<String>,
    pub extra: Map<String, Value>,
}

/// A manifest split into header metadata and Markdown body.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub metadata: SkillMetadata,
    /// Document text after the header, leading whitespace removed.
    pub body: String,
}

/// Parse manifest bytes. `source` only labels error messages.
pub fn parse_bytes(bytes: &[u8], source: &str) -> Result<Manifest> {
    let text = std::str::from_utf8(bytes).map_err(|err| {
        SkillzError::Validation(format!("{source}: manifest is not valid UTF-8: {err}"))
    })?;
    parse_str(text, source)
}

/// Parse a manifest document.
pub fn parse_str(text: &str, source: &str) -> Result<Manifest> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let captures = FRONT_MATTER.captures(text).ok_or_else(|| {
        SkillzError::Validation(format!("{source}: missing YAML front matter"))
    })?;
    let header = captures.get(1).map_or("", |m| m.as_str());
    let body = captures.get(2).map_or("", |m| m.as_str());

    let parsed: Yaml = serde_yaml::from_str(header).map_err(|err| {
        SkillzError::Validation(format!("{source}: invalid YAML front matter: {err}"))
    })?;
    let mapping = match parsed {
        Yaml::Null => serde_yaml::Mapping::new(),
        Yaml::Mapping(mapping) => mapping,
        other => {
            return Err(SkillzError::Validation(format!(
                "{source}: front matter must define a mapping, not {}",
                yaml_type_name(&other)
            )));
        }
    };

    let name = required_field(&mapping, "name", source)?;
    let description = required_field(&mapping, "description", source)?;
    let license = mapping
        .get("license")
        .filter(|value| is_truthy(value))
        .and_then(scalar_to_string)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let allowed_tools = mapping
        .get("allowed-tools")
        .filter(|value| is_truthy(value))
        .or_else(|| mapping.get("allowed_tools"))
        .map(parse_allowed_tools)
        .unwrap_or_default();

    let extra = mapping
        .iter()
        .filter_map(|(key, value)| {
            let key = scalar_to_string(key)?;
            (!RECOGNIZED_KEYS.contains(&key.as_str())).then(|| (key, yaml_to_json(value)))
        })
        .collect();

    Ok(Manifest {
        metadata: SkillMetadata {
            name,
            description,
            license,
            allowed_tools,
            extra,
        },
        body: body.trim_start().to_string(),
    })
}

fn required_field(mapping: &serde_yaml::Mapping, key: &str, source: &str) -> Result<String> {
    let value = match mapping.get(key) {
        None | Some(Yaml::Null) => String::new(),
        Some(value) => scalar_to_string(value).ok_or_else(|| {
            SkillzError::Validation(format!("{source}: '{key}' must be a string"))
        })?,
    };
    let value = value.trim();
    if value.is_empty() {
        return Err(SkillzError::Validation(format!(
            "{source}: missing required '{key}' in front matter"
        )));
    }
    Ok(value.to_string())
}

/// Comma-joined string or sequence; anything else yields no tools.
fn parse_allowed_tools(value: &Yaml) -> Vec<String> {
    match value {
        Yaml::String(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|tool| !tool.is_empty())
            .map(str::to_string)
            .collect(),
        Yaml::Sequence(items) => items
            .iter()
            .filter_map(scalar_to_string)
            .map(|tool| tool.trim().to_string())
            .filter(|tool| !tool.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn scalar_to_string(value: &Yaml) -> Option<String> {
    match value {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Bool(b) => Some(b.to_string()),
        Yaml::Tagged(tagged) => scalar_to_string(&tagged.value),
        Yaml::Null | Yaml::Sequence(_) | Yaml::Mapping(_) => None,
    }
}

fn is_truthy(value: &Yaml) -> bool {
    match value {
        Yaml::Null => false,
        Yaml::Bool(b) => *b,
        Yaml::String(s) => !s.is_empty(),
        Yaml::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Yaml::Sequence(items) => !items.is_empty(),
        Yaml::Mapping(map) => !map.is_empty(),
        Yaml::Tagged(tagged) => is_truthy(&tagged.value),
    }
}

/// Lossless-enough YAML to JSON conversion; non-string keys are stringified.
fn yaml_to_json(value: &Yaml) -> Value {
    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(items) => Value::Array(items.iter().map(yaml_to_json).collect()),
        Yaml::Mapping(map) => Value::Object(
            map.iter()
                .filter_map(|(k, v)| Some((scalar_to_string(k)?, yaml_to_json(v))))
                .collect(),
        ),
        Yaml::Tagged(tagged) => yaml_to_json(&tagged.value),
    }
}

const fn yaml_type_name(value: &Yaml) -> &'static str {
    match value {
        Yaml::Null => "null",
        Yaml::Bool(_) => "a boolean",
        Yaml::Number(_) => "a number",
        Yaml::String(_) => "a string",
        Yaml::Sequence(_) => "a sequence",
        Yaml::Mapping(_) => "a mapping",
        Yaml::Tagged(_) => "a tagged value",
    }
}
