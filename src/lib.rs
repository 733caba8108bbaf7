pub mod app;
pub mod bundle;
pub mod cli;
pub mod config;
pub mod encoding;
pub mod error;
pub mod manifest;
pub mod mcp;
pub mod registry;
pub mod resource;
pub mod sandbox;
pub mod service;
pub mod test_utils;
pub mod usage;

pub use error::{Result, SkillzError};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
