//! Text-or-base64 payloads shared by resource reads and script I/O.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SkillzError};

/// How a payload's `content` string is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    #[serde(alias = "utf-8", alias = "utf8")]
    Text,
    Base64,
}

impl Encoding {
    /// Parse an encoding tag, case-insensitively.
    pub fn parse(tag: &str) -> Result<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "text" | "utf-8" | "utf8" => Ok(Self::Text),
            "base64" => Ok(Self::Base64),
            _ => Err(SkillzError::Execution(format!(
                "Unsupported encoding '{tag}'."
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Base64 => "base64",
        }
    }
}

/// A byte payload carried as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedContent {
    pub encoding: Encoding,
    pub content: String,
}

impl EncodedContent {
    /// Strict UTF-8 when possible, base64 otherwise. Never fails.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(content) => Self {
                encoding: Encoding::Text,
                content,
            },
            Err(err) => Self {
                encoding: Encoding::Base64,
                content: STANDARD.encode(err.into_bytes()),
            },
        }
    }

    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            encoding: Encoding::Text,
            content: content.into(),
        }
    }

    /// Recover the raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        match self.encoding {
            Encoding::Text => Ok(self.content.clone().into_bytes()),
            Encoding::Base64 => STANDARD
                .decode(self.content.trim())
                .map_err(|err| SkillzError::Execution(format!("invalid base64 content: {err}"))),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
