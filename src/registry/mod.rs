//! Skill discovery and lookup.
//!
//! [`SkillRegistry::load`] scans the immediate children of a skills root in
//! sorted path order. Directories holding a `SKILL.md` and `.zip`/`.skill`
//! archives with a manifest at their effective root become candidates. Each
//! candidate either registers or is discarded with a reason recorded in the
//! [`LoadReport`]; only an unusable root aborts the load.

mod skill;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info, warn};

pub use skill::{FALLBACK_SLUG, Skill, SkillSummary, slugify};

use crate::bundle::{ArchiveBundle, BundleSource, DirectoryBundle, MANIFEST_FILE, is_archive_path};
use crate::error::{Result, SkillzError};
use crate::manifest;

/// Why a candidate bundle was not registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    InvalidManifest { message: String },
    UnreadableArchive { message: String },
    DuplicateSlug { slug: String },
    DuplicateName { name: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidManifest { message } => write!(f, "invalid manifest: {message}"),
            Self::UnreadableArchive { message } => write!(f, "unreadable archive: {message}"),
            Self::DuplicateSlug { slug } => write!(f, "duplicate slug '{slug}'"),
            Self::DuplicateName { name } => write!(f, "duplicate skill name '{name}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCandidate {
    pub path: PathBuf,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Outcome of one load pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Registered slugs in discovery order.
    pub registered: Vec<String>,
    pub skipped: Vec<SkippedCandidate>,
}

/// Immutable collection of skills discovered under one root.
#[derive(Debug, Default)]
pub struct SkillRegistry {
    root: PathBuf,
    skills: Vec<Skill>,
    by_slug: HashMap<String, usize>,
    report: LoadReport,
}

impl SkillRegistry {
    /// Discover every skill directly under `root`.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(SkillzError::Discovery(format!(
                "skills root {} does not exist",
                root.display()
            )));
        }
        if !root.is_dir() {
            return Err(SkillzError::Discovery(format!(
                "skills root {} is not a directory",
                root.display()
            )));
        }
        let root = root.canonicalize()?;

        let mut children: Vec<PathBuf> = fs::read_dir(&root)
            .map_err(|err| {
                SkillzError::Discovery(format!("cannot read skills root {}: {err}", root.display()))
            })?
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(err) => {
                    warn!(error = %err, "Skipping unreadable entry in skills root");
                    None
                }
            })
            .collect();
        children.sort();

        let mut registry = Self {
            root,
            ..Self::default()
        };
        let mut names = HashSet::new();

        for child in children {
            let Some(source) = registry.open_candidate(&child) else {
                continue;
            };
            registry.consider(&child, source, &mut names);
        }

        info!(
            root = %registry.root.display(),
            registered = registry.report.registered.len(),
            skipped = registry.report.skipped.len(),
            "Skill discovery complete"
        );
        Ok(registry)
    }

    /// Bundle for `child` if it looks like a skill at all.
    fn open_candidate(&mut self, child: &Path) -> Option<Box<dyn BundleSource>> {
        if child.is_dir() {
            if !child.join(MANIFEST_FILE).is_file() {
                debug!(path = %child.display(), "Directory has no manifest; ignoring");
                return None;
            }
            return match DirectoryBundle::open(child) {
                Ok(bundle) => Some(Box::new(bundle)),
                Err(err) => {
                    warn!(path = %child.display(), error = %err, "Cannot open skill directory");
                    None
                }
            };
        }

        if child.is_file() && is_archive_path(child) {
            return match ArchiveBundle::open(child) {
                Ok(Some(bundle)) => Some(Box::new(bundle)),
                Ok(None) => {
                    debug!(path = %child.display(), "Archive has no manifest; ignoring");
                    None
                }
                Err(err) => {
                    warn!(path = %child.display(), error = %err, "Skipping unreadable skill archive");
                    self.skip(child, SkipReason::UnreadableArchive {
                        message: err.to_string(),
                    });
                    None
                }
            };
        }

        None
    }

    /// Validate one candidate and register it unless it collides.
    fn consider(&mut self, child: &Path, source: Box<dyn BundleSource>, names: &mut HashSet<String>) {
        let parsed = source
            .read(MANIFEST_FILE)
            .and_then(|bytes| manifest::parse_bytes(&bytes, &child.display().to_string()));
        let manifest = match parsed {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!(path = %child.display(), error = %err, "Skipping skill with invalid manifest");
                self.skip(child, SkipReason::InvalidManifest {
                    message: err.to_string(),
                });
                return;
            }
        };

        let name = manifest.metadata.name.clone();
        let slug = slugify(&name);
        if let Some(&existing) = self.by_slug.get(&slug) {
            error!(
                slug = %slug,
                path = %child.display(),
                existing = %self.skills[existing].locator().display(),
                "Duplicate skill slug; keeping the first registration"
            );
            self.skip(child, SkipReason::DuplicateSlug { slug });
            return;
        }
        if names.contains(&name) {
            warn!(name = %name, path = %child.display(), "Duplicate skill name; skipping");
            self.skip(child, SkipReason::DuplicateName { name });
            return;
        }

        let skill = match Skill::new(manifest, source) {
            Ok(skill) => skill,
            Err(err) => {
                warn!(path = %child.display(), error = %err, "Cannot enumerate skill files");
                self.skip(child, SkipReason::UnreadableArchive {
                    message: err.to_string(),
                });
                return;
            }
        };

        info!(
            slug = %slug,
            kind = %skill.source().kind(),
            resources = skill.resources().len(),
            "Registered skill"
        );
        names.insert(name);
        self.by_slug.insert(slug.clone(), self.skills.len());
        self.report.registered.push(slug);
        self.skills.push(skill);
    }

    fn skip(&mut self, path: &Path, reason: SkipReason) {
        self.report.skipped.push(SkippedCandidate {
            path: path.to_path_buf(),
            reason,
        });
    }

    /// Look up a skill by slug.
    pub fn get(&self, slug: &str) -> Result<&Skill> {
        self.find(slug)
            .ok_or_else(|| SkillzError::SkillNotFound(slug.to_string()))
    }

    #[must_use]
    pub fn find(&self, slug: &str) -> Option<&Skill> {
        self.by_slug.get(slug).map(|&index| &self.skills[index])
    }

    /// All skills in discovery order.
    #[must_use]
    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub const fn report(&self) -> &LoadReport {
        &self.report
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.skills.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }
}
