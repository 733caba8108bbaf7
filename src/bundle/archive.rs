use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use super::{BundleKind, BundleSource, MANIFEST_FILE, is_junk, normalize_relative};
use crate::error::{Result, SkillzError};
use crate::resource::ResourceMiss;

#[derive(Debug, Clone)]
struct Member {
    /// Entry name exactly as stored in the archive.
    name: String,
    unix_mode: Option<u32>,
}

/// A bundle stored inside a `.zip`/`.skill` archive.
///
/// Only the member table is kept in memory; every read reopens the archive.
#[derive(Debug, Clone)]
pub struct ArchiveBundle {
    path: PathBuf,
    /// Wrapper directory stripped from member names, e.g. `my-skill/`.
    prefix: Option<String>,
    members: BTreeMap<String, Member>,
}

impl ArchiveBundle {
    /// Inspect the archive at `path`.
    ///
    /// Returns `Ok(None)` when the archive is readable but has no manifest at
    /// its effective root, and an error when it cannot be read at all.
    pub fn open(path: &Path) -> Result<Option<Self>> {
        let mut archive = ZipArchive::new(File::open(path)?)?;

        let mut raw = Vec::new();
        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index)?;
            if entry.is_dir() || entry.name().ends_with('/') {
                continue;
            }
            let Some(rel) = normalize_relative(entry.name()) else {
                debug!(archive = %path.display(), entry = entry.name(), "Skipping archive entry outside the bundle root");
                continue;
            };
            if rel.is_empty() || is_junk(&rel) {
                continue;
            }
            raw.push((
                rel,
                Member {
                    name: entry.name().to_string(),
                    unix_mode: entry.unix_mode(),
                },
            ));
        }

        let prefix = common_wrapper(raw.iter().map(|(rel, _)| rel.as_str()));
        let members: BTreeMap<String, Member> = raw
            .into_iter()
            .map(|(rel, member)| {
                let rel = match &prefix {
                    Some(prefix) => rel[prefix.len()..].to_string(),
                    None => rel,
                };
                (rel, member)
            })
            .collect();

        if !members.contains_key(MANIFEST_FILE) {
            debug!(archive = %path.display(), "Archive has no manifest at its root");
            return Ok(None);
        }

        Ok(Some(Self {
            path: path.to_path_buf(),
            prefix,
            members,
        }))
    }

    /// Wrapper directory that was stripped, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    fn member(&self, rel: &str) -> Result<&Member> {
        let normalized = normalize_relative(rel).ok_or(ResourceMiss::PathTraversal)?;
        self.members
            .get(&normalized)
            .ok_or_else(|| SkillzError::NotFound(rel.to_string()))
    }

    fn reopen(&self) -> Result<ZipArchive<File>> {
        Ok(ZipArchive::new(File::open(&self.path)?)?)
    }
}

/// `"<dir>/"` when every path sits under the same top-level directory.
fn common_wrapper<'a>(mut paths: impl Iterator<Item = &'a str>) -> Option<String> {
    let first = paths.next()?;
    let (top, _) = first.split_once('/')?;
    let prefix = format!("{top}/");
    paths
        .all(|path| path.starts_with(&prefix))
        .then_some(prefix)
}

impl BundleSource for ArchiveBundle {
    fn kind(&self) -> BundleKind {
        BundleKind::Archive
    }

    fn locator(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> Result<Vec<String>> {
        Ok(self.members.keys().cloned().collect())
    }

    fn read(&self, rel: &str) -> Result<Vec<u8>> {
        let member = self.member(rel)?;
        let mut archive = self.reopen()?;
        let mut file = match archive.by_name(&member.name) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Err(SkillzError::NotFound(rel.to_string())),
            Err(err) => return Err(err.into()),
        };
        let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    fn contains(&self, rel: &str) -> bool {
        self.member(rel).is_ok()
    }

    fn materialize(&self, dest: &Path) -> Result<()> {
        let mut archive = self.reopen()?;
        for (rel, member) in &self.members {
            let target = dest.join(rel);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = archive.by_name(&member.name)?;
            let mut out = File::create(&target)?;
            io::copy(&mut file, &mut out)?;

            #[cfg(unix)]
            if let Some(mode) = member.unix_mode {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&target, fs::Permissions::from_mode(mode & 0o777))?;
            }
        }
        Ok(())
    }
}
