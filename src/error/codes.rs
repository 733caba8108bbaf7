//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Skill errors
//! - 2xx: Resource addressing errors
//! - 3xx: Config errors
//! - 4xx: Execution errors
//! - 5xx: Discovery errors
//! - 6xx: Storage errors
//! - 8xx: Validation errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for JSON output.
///
/// Each variant maps to a numeric code (e.g., `SkillNotFound` -> E101).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Skill errors (1xx)
    // ========================================
    /// E101: Requested skill slug is not registered
    SkillNotFound,

    // ========================================
    // Resource errors (2xx)
    // ========================================
    /// E201: URI does not use the skill resource scheme
    UnsupportedPrefix,
    /// E202: URI is missing a slug or cannot be decoded
    InvalidResourceUri,
    /// E203: Path does not name a resource in the skill
    ResourceNotFound,
    /// E204: Path escapes the skill bundle
    PathTraversal,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E301: Config file has invalid syntax or values
    ConfigInvalid,

    // ========================================
    // Execution errors (4xx)
    // ========================================
    /// E401: Script could not be prepared, launched or awaited
    ExecutionFailed,
    /// E402: Script exceeded its wall-clock bound
    ExecutionTimeout,
    /// E403: Target resource is not a script
    ScriptNotRunnable,

    // ========================================
    // Discovery errors (5xx)
    // ========================================
    /// E501: Skills root is missing or not a directory
    SkillsRootInvalid,

    // ========================================
    // Storage errors (6xx)
    // ========================================
    /// E601: Archive could not be opened or decoded
    ArchiveError,
    /// E602: JSON/YAML (de)serialization failed
    SerializationError,

    // ========================================
    // Validation errors (8xx)
    // ========================================
    /// E801: Request arguments failed validation
    ValidationFailed,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E905: Generic not found (catch-all)
    NotFound,
    /// E906: IO operation failed
    IoError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `SkillNotFound` -> 101).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::SkillNotFound => 101,

            Self::UnsupportedPrefix => 201,
            Self::InvalidResourceUri => 202,
            Self::ResourceNotFound => 203,
            Self::PathTraversal => 204,

            Self::ConfigInvalid => 301,

            Self::ExecutionFailed => 401,
            Self::ExecutionTimeout => 402,
            Self::ScriptNotRunnable => 403,

            Self::SkillsRootInvalid => 501,

            Self::ArchiveError => 601,
            Self::SerializationError => 602,

            Self::ValidationFailed => 801,

            Self::NotFound => 905,
            Self::IoError => 906,
        }
    }

    /// Get the error code as a formatted string (e.g., "E101").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::SkillNotFound => "Run `skillz list` to see the registered skill slugs",
            Self::UnsupportedPrefix | Self::InvalidResourceUri => {
                "Use a URI of the form resource://skillz/{skill-slug}/{path}"
            }
            Self::ResourceNotFound => "Run `skillz show <slug>` to list the skill's resource URIs",
            Self::PathTraversal => "Resource paths must stay inside the skill bundle",
            Self::ConfigInvalid => "Fix the JSON in .skillz-config.json or the file passed with --config",
            Self::ExecutionFailed => "Check the script's shebang, interpreter availability and request payload",
            Self::ExecutionTimeout => "Increase the bound with --timeout or make the script finish sooner",
            Self::ScriptNotRunnable => "Read the file as a resource instead of running it",
            Self::SkillsRootInvalid => "Pass an existing directory with --root or set SKILLZ_ROOT",
            Self::ArchiveError => "Re-create the .zip/.skill archive; it could not be read",
            Self::SerializationError => "Check the payload for malformed JSON or YAML",
            Self::ValidationFailed => "Check the request arguments and their types",
            Self::NotFound => "Verify the path or identifier exists",
            Self::IoError => "Check file permissions and available disk space",
        }
    }

    /// Whether the caller can fix the condition and retry.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::IoError | Self::ArchiveError)
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "skill",
            2 => "resource",
            3 => "config",
            4 => "execution",
            5 => "discovery",
            6 => "storage",
            8 => "validation",
            9 => "internal",
            _ => "unknown",
        }
    }

    /// Iterate over all error codes.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::SkillNotFound,
            Self::UnsupportedPrefix,
            Self::InvalidResourceUri,
            Self::ResourceNotFound,
            Self::PathTraversal,
            Self::ConfigInvalid,
            Self::ExecutionFailed,
            Self::ExecutionTimeout,
            Self::ScriptNotRunnable,
            Self::SkillsRootInvalid,
            Self::ArchiveError,
            Self::SerializationError,
            Self::ValidationFailed,
            Self::NotFound,
            Self::IoError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}
