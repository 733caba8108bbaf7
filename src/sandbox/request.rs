//! Caller-supplied options for one script run.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::encoding::{EncodedContent, Encoding};
use crate::error::{Result, SkillzError};

/// A file to write into the workspace before the script starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Bundle-relative destination.
    pub path: String,
    pub content: EncodedContent,
}

/// Everything optional about a run: extra files, arguments, stdin, cwd, env.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    pub files: Vec<InputFile>,
    pub args: Vec<String>,
    pub stdin: Option<EncodedContent>,
    /// Bundle-relative working directory; defaults to the script's directory.
    pub workdir: Option<String>,
    /// Applied over the forwarded host variables.
    pub env: BTreeMap<String, String>,
}

impl RunRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn stdin(mut self, content: EncodedContent) -> Self {
        self.stdin = Some(content);
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn file(mut self, path: impl Into<String>, content: EncodedContent) -> Self {
        self.files.push(InputFile {
            path: path.into(),
            content,
        });
        self
    }

    #[must_use]
    pub fn workdir(mut self, dir: impl Into<String>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Build a request from loosely typed JSON, rejecting wrong shapes.
    ///
    /// `null` or a missing value is an empty request.
    pub fn from_json(value: Option<&Value>) -> Result<Self> {
        let Some(value) = value.filter(|v| !v.is_null()) else {
            return Ok(Self::default());
        };
        let object = value
            .as_object()
            .ok_or_else(|| invalid("Run options must be an object."))?;

        let mut request = Self::default();
        if let Some(files) = object.get("files").filter(|v| !v.is_null()) {
            request.files = parse_files(files)?;
        }
        if let Some(args) = object.get("args").filter(|v| !v.is_null()) {
            request.args = parse_args(args)?;
        }
        if let Some(stdin) = object.get("stdin").filter(|v| !v.is_null()) {
            request.stdin = Some(parse_payload(stdin, "stdin")?);
        }
        if let Some(workdir) = object.get("workdir").filter(|v| !v.is_null()) {
            request.workdir = Some(
                workdir
                    .as_str()
                    .ok_or_else(|| invalid("'workdir' must be a string."))?
                    .to_string(),
            );
        }
        if let Some(env) = object.get("env").filter(|v| !v.is_null()) {
            request.env = parse_env(env)?;
        }
        Ok(request)
    }
}

fn invalid(message: &str) -> SkillzError {
    SkillzError::Execution(message.to_string())
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_args(value: &Value) -> Result<Vec<String>> {
    if value.is_string() {
        return Err(invalid("'args' must be a list of strings, not a single string."));
    }
    value
        .as_array()
        .ok_or_else(|| invalid("'args' must be a list of strings."))?
        .iter()
        .map(|arg| scalar_string(arg).ok_or_else(|| invalid("'args' must be a list of strings.")))
        .collect()
}

fn parse_env(value: &Value) -> Result<BTreeMap<String, String>> {
    value
        .as_object()
        .ok_or_else(|| invalid("'env' must be a mapping of variable names to values."))?
        .iter()
        .map(|(key, value)| {
            scalar_string(value)
                .map(|value| (key.clone(), value))
                .ok_or_else(|| {
                    SkillzError::Execution(format!("Environment value for '{key}' must be a scalar."))
                })
        })
        .collect()
}

/// Plain string, or `{content, encoding}`.
fn parse_payload(value: &Value, field: &str) -> Result<EncodedContent> {
    match value {
        Value::String(text) => Ok(EncodedContent::text(text.clone())),
        Value::Object(object) => {
            let content = object
                .get("content")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    SkillzError::Execution(format!("'{field}' object must include string 'content'."))
                })?;
            let encoding = match object.get("encoding") {
                None | Some(Value::Null) => Encoding::Text,
                Some(Value::String(tag)) => Encoding::parse(tag)?,
                Some(_) => {
                    return Err(SkillzError::Execution(format!(
                        "'{field}' encoding must be a string."
                    )));
                }
            };
            Ok(EncodedContent {
                encoding,
                content: content.to_string(),
            })
        }
        _ => Err(SkillzError::Execution(format!(
            "'{field}' must be a string or an object with 'content' and optional 'encoding'."
        ))),
    }
}

fn parse_files(value: &Value) -> Result<Vec<InputFile>> {
    let entries = value
        .as_array()
        .ok_or_else(|| invalid("'files' must be a list of {path, content, encoding} objects."))?;
    entries
        .iter()
        .map(|entry| {
            let object = entry
                .as_object()
                .ok_or_else(|| invalid("Each file entry must be an object."))?;
            let path = object
                .get("path")
                .and_then(Value::as_str)
                .filter(|path| !path.is_empty())
                .ok_or_else(|| invalid("Each file entry must include 'path' and 'content'."))?;
            if !object.contains_key("content") {
                return Err(invalid("Each file entry must include 'path' and 'content'."));
            }
            Ok(InputFile {
                path: path.to_string(),
                content: parse_payload(entry, "files")?,
            })
        })
        .collect()
}
