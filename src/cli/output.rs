use clap::ValueEnum;
use serde::Serialize;

use crate::error::{Result, SkillzError, StructuredError};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable formatted output with colors (default)
    #[default]
    Human,
    /// Pretty-printed JSON
    Json,
}

impl OutputFormat {
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)?;
    println!("{payload}");
    Ok(())
}

/// Report a failed command the way `format` expects.
pub fn emit_error(format: OutputFormat, err: &SkillzError) {
    if format.is_json() {
        let structured = StructuredError::from(err);
        match serde_json::to_string_pretty(&structured) {
            Ok(payload) => println!("{payload}"),
            Err(_) => eprintln!("Error: {err}"),
        }
    } else {
        eprintln!("Error: {err}");
    }
}
