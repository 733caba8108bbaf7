//! Private, throwaway copy of a bundle.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use super::request::InputFile;
use crate::bundle::normalize_relative;
use crate::error::{Result, SkillzError};
use crate::registry::Skill;

const WORKSPACE_PREFIX: &str = "skillz-";

/// A temporary directory holding a full copy of one skill's bundle.
///
/// Dropping the workspace removes it, whatever path the run took.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    bundle_root: PathBuf,
}

impl Workspace {
    /// Create a fresh directory and copy the skill's files into it.
    pub fn create(skill: &Skill) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()
            .map_err(|err| SkillzError::Execution(format!("Failed to create workspace: {err}")))?;
        let workspace = Self {
            bundle_root: dir.path().join(skill.slug()),
            dir: Some(dir),
        };
        fs::create_dir_all(&workspace.bundle_root)?;
        skill.source().materialize(&workspace.bundle_root).map_err(|err| {
            SkillzError::Execution(format!("Failed to copy skill {}: {err}", skill.slug()))
        })?;
        debug!(path = %workspace.bundle_root.display(), slug = skill.slug(), "Materialized workspace");
        Ok(workspace)
    }

    /// Root of the copied bundle.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.bundle_root
    }

    /// Path of `rel` inside the copy, refusing anything that climbs out.
    pub fn resolve(&self, rel: &str, what: &str) -> Result<PathBuf> {
        let normalized = normalize_relative(rel).ok_or_else(|| {
            SkillzError::Execution(format!("{what} '{rel}' escapes the skill bundle."))
        })?;
        Ok(self.bundle_root.join(normalized))
    }

    /// Existing directory `rel` inside the copy.
    pub fn resolve_dir(&self, rel: &str) -> Result<PathBuf> {
        let path = self.resolve(rel, "Working directory")?;
        if !path.is_dir() {
            return Err(SkillzError::Execution(format!(
                "Working directory '{rel}' does not exist in the skill bundle."
            )));
        }
        Ok(path)
    }

    /// Write a caller-supplied file, creating parent directories.
    pub fn write_file(&self, file: &InputFile) -> Result<PathBuf> {
        let target = self.resolve(&file.path, "File")?;
        if target == self.bundle_root {
            return Err(SkillzError::Execution(format!(
                "File path '{}' does not name a file.",
                file.path
            )));
        }
        let bytes = file.content.decode().map_err(|err| {
            SkillzError::Execution(format!("Invalid content for file '{}': {err}", file.path))
        })?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, bytes)?;
        Ok(target)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            match dir.close() {
                Ok(()) => debug!(path = %path.display(), "Removed workspace"),
                Err(err) => warn!(path = %path.display(), error = %err, "Failed to remove workspace"),
            }
        }
    }
}
