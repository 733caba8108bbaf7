use serde::Serialize;
use thiserror::Error;

use super::SCHEME_PREFIX;
use crate::encoding::Encoding;
use crate::error::ErrorCode;

/// Why a resource URI could not be served.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceMiss {
    #[error("unsupported URI prefix. Expected resource://skillz/{{skill-slug}}/{{path}}")]
    UnsupportedPrefix,

    #[error("invalid resource URI format")]
    InvalidFormat,

    #[error("skill not found: {0}")]
    SkillNotFound(String),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("invalid path: path traversal not allowed")]
    PathTraversal,
}

impl ResourceMiss {
    /// Stable category string reported to callers.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedPrefix => "unsupported_prefix",
            Self::InvalidFormat => "invalid_format",
            Self::SkillNotFound(_) => "skill_not_found",
            Self::ResourceNotFound(_) => "resource_not_found",
            Self::PathTraversal => "path_traversal",
        }
    }

    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedPrefix => ErrorCode::UnsupportedPrefix,
            Self::InvalidFormat => ErrorCode::InvalidResourceUri,
            Self::SkillNotFound(_) => ErrorCode::SkillNotFound,
            Self::ResourceNotFound(_) => ErrorCode::ResourceNotFound,
            Self::PathTraversal => ErrorCode::PathTraversal,
        }
    }

    /// Textual payload standing in for the resource content.
    #[must_use]
    pub fn to_payload(&self, uri: &str) -> MissPayload {
        MissPayload {
            uri: uri.to_string(),
            name: uri
                .strip_prefix(SCHEME_PREFIX)
                .unwrap_or(uri)
                .to_string(),
            mime_type: "text/plain",
            content: format!("Error: {self}"),
            encoding: Encoding::Text,
            error: self.code(),
        }
    }
}

/// Error resource returned instead of raising into the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissPayload {
    pub uri: String,
    pub name: String,
    pub mime_type: &'static str,
    pub content: String,
    pub encoding: Encoding,
    pub error: &'static str,
}
