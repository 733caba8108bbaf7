use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{BundleKind, BundleSource, is_junk, normalize_relative};
use crate::error::{Result, SkillzError};
use crate::resource::ResourceMiss;

/// A bundle stored as a plain directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryBundle {
    root: PathBuf,
}

impl DirectoryBundle {
    /// Open the directory at `root`. The root is canonicalized so later
    /// containment checks see through symlinks.
    pub fn open(root: &Path) -> Result<Self> {
        let root = root.canonicalize()?;
        if !root.is_dir() {
            return Err(SkillzError::NotFound(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// Absolute on-disk path for `rel`, refusing anything outside the root.
    fn resolve(&self, rel: &str) -> Result<PathBuf> {
        let normalized = normalize_relative(rel).ok_or(ResourceMiss::PathTraversal)?;
        if normalized.is_empty() || is_junk(&normalized) {
            return Err(SkillzError::NotFound(rel.to_string()));
        }
        let canonical = self
            .root
            .join(&normalized)
            .canonicalize()
            .map_err(|_| SkillzError::NotFound(rel.to_string()))?;
        if !canonical.starts_with(&self.root) {
            return Err(ResourceMiss::PathTraversal.into());
        }
        Ok(canonical)
    }
}

impl BundleSource for DirectoryBundle {
    fn kind(&self) -> BundleKind {
        BundleKind::Directory
    }

    fn locator(&self) -> &Path {
        &self.root
    }

    fn entries(&self) -> Result<Vec<String>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(root = %self.root.display(), error = %err, "Skipping unreadable bundle entry");
                    continue;
                }
            };
            let file_type = entry.file_type();
            if !file_type.is_file() && !file_type.is_symlink() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let Some(relative) = relative.to_str() else {
                debug!(path = %entry.path().display(), "Skipping non-UTF-8 file name");
                continue;
            };
            let Some(relative) = normalize_relative(relative) else {
                continue;
            };
            if relative.is_empty() || is_junk(&relative) {
                continue;
            }
            // Links count only when they land on a file inside the bundle.
            if file_type.is_symlink() && !self.contains(&relative) {
                debug!(path = %entry.path().display(), "Skipping symlink that leaves the bundle");
                continue;
            }
            files.push(relative);
        }
        files.sort();
        Ok(files)
    }

    fn read(&self, rel: &str) -> Result<Vec<u8>> {
        let path = self.resolve(rel)?;
        if !path.is_file() {
            return Err(SkillzError::NotFound(rel.to_string()));
        }
        Ok(fs::read(path)?)
    }

    fn contains(&self, rel: &str) -> bool {
        self.resolve(rel).is_ok_and(|path| path.is_file())
    }

    #[cfg(unix)]
    fn is_executable(&self, rel: &str) -> bool {
        use std::os::unix::fs::PermissionsExt;

        self.resolve(rel)
            .and_then(|path| Ok(fs::metadata(path)?))
            .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
    }

    fn materialize(&self, dest: &Path) -> Result<()> {
        for rel in self.entries()? {
            let target = dest.join(&rel);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(self.resolve(&rel)?, &target)?;
        }
        Ok(())
    }
}
