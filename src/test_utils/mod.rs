//! Shared test utilities for skillz.

pub mod fixtures;

pub use fixtures::{SkillFixture, SkillSpec, write_zip};
