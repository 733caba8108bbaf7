//! Storage backends for skill bundles.
//!
//! A bundle is a read-only tree of files addressed by normalized relative
//! paths. It lives either in a plain directory ([`DirectoryBundle`]) or in a
//! `.zip`/`.skill` archive ([`ArchiveBundle`]). Everything above this module
//! talks to [`BundleSource`] and never to a concrete backend.

mod archive;
mod directory;
pub mod path;

use std::fmt;
use std::path::Path;

use serde::Serialize;

pub use archive::ArchiveBundle;
pub use directory::DirectoryBundle;
pub use path::{is_junk, normalize_relative};

use crate::error::Result;

/// File name of the manifest at a bundle's root.
pub const MANIFEST_FILE: &str = "SKILL.md";

/// File extensions recognized as skill archives.
pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "skill"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleKind {
    Directory,
    Archive,
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => write!(f, "directory"),
            Self::Archive => write!(f, "archive"),
        }
    }
}

/// Read access to the files of one bundle.
pub trait BundleSource: Send + Sync + fmt::Debug {
    fn kind(&self) -> BundleKind;

    /// Directory or archive file backing this bundle.
    fn locator(&self) -> &Path;

    /// Relative paths of every file, sorted, junk excluded.
    ///
    /// Each call re-reads the listing, so the sequence can be restarted.
    fn entries(&self) -> Result<Vec<String>>;

    /// Exact bytes of the file at `rel`; `SkillzError::NotFound` when absent.
    fn read(&self, rel: &str) -> Result<Vec<u8>>;

    fn contains(&self, rel: &str) -> bool;

    /// Whether `rel` carries an executable permission bit on disk.
    fn is_executable(&self, _rel: &str) -> bool {
        false
    }

    /// Copy every file of the bundle under `dest`.
    fn materialize(&self, dest: &Path) -> Result<()>;
}

/// Whether `path` has one of the archive extensions (case-insensitive).
#[must_use]
pub fn is_archive_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ARCHIVE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}
