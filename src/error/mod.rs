//! Error handling for skillz.
//!
//! This module provides:
//! - [`SkillzError`]: The main error enum for all skillz operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Error payload with code, suggestion and context for JSON output

mod codes;

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use codes::ErrorCode;

use crate::resource::ResourceMiss;

/// Main error type for skillz operations.
#[derive(Error, Debug)]
pub enum SkillzError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Malformed or incomplete manifest, or a request argument of the wrong shape.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The skills root cannot be scanned.
    #[error("Discovery failed: {0}")]
    Discovery(String),

    #[error("Unknown skill: {0}")]
    SkillNotFound(String),

    /// A bundle entry that does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Resource(#[from] ResourceMiss),

    #[error("{0}")]
    Execution(String),

    #[error("'{path}' is not a runnable script. Read it with fetch_resource instead: {uri}")]
    NotRunnable { path: String, uri: String },

    #[error("Execution timed out after {seconds} seconds for {script}.")]
    Timeout { script: String, seconds: f64 },

    #[error("Config error: {0}")]
    Config(String),
}

impl SkillzError {
    /// Get the error code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::Archive(_) => ErrorCode::ArchiveError,
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::Discovery(_) => ErrorCode::SkillsRootInvalid,
            Self::SkillNotFound(_) => ErrorCode::SkillNotFound,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Resource(miss) => miss.error_code(),
            Self::Execution(_) => ErrorCode::ExecutionFailed,
            Self::NotRunnable { .. } => ErrorCode::ScriptNotRunnable,
            Self::Timeout { .. } => ErrorCode::ExecutionTimeout,
            Self::Config(_) => ErrorCode::ConfigInvalid,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::SkillNotFound(slug) => Some(serde_json::json!({ "skill": slug })),
            Self::Resource(miss) => Some(serde_json::json!({ "miss": miss.code() })),
            Self::NotRunnable { path, uri } => {
                Some(serde_json::json!({ "path": path, "resource_uri": uri }))
            }
            Self::Timeout { script, seconds } => {
                Some(serde_json::json!({ "script": script, "timeout_seconds": seconds }))
            }
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "SKILL_NOT_FOUND")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 101)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    pub recoverable: bool,

    /// Error category (e.g., "skill", "execution")
    pub category: String,
}

impl StructuredError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn from_error(err: &SkillzError) -> Self {
        let mut structured = Self::new(err.code(), err.to_string());
        structured.context = err.context();
        structured
    }

    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<&SkillzError> for StructuredError {
    fn from(err: &SkillzError) -> Self {
        Self::from_error(err)
    }
}

/// Result type alias using SkillzError.
pub type Result<T> = std::result::Result<T, SkillzError>;
