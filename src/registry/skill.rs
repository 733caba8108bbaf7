use std::path::Path;

use serde::Serialize;

use crate::bundle::{BundleKind, BundleSource, MANIFEST_FILE};
use crate::error::Result;
use crate::manifest::{Manifest, SkillMetadata};

/// Fallback slug for names with no alphanumeric characters.
pub const FALLBACK_SLUG: &str = "skill";

/// Derive a stable, URL-safe identifier from a display name.
///
/// Lowercases, collapses every run of non-alphanumeric characters into one
/// `-`, and trims hyphens from both ends.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// A registered skill: one manifest over one bundle.
#[derive(Debug)]
pub struct Skill {
    slug: String,
    manifest: Manifest,
    source: Box<dyn BundleSource>,
    resources: Vec<String>,
}

impl Skill {
    pub(crate) fn new(manifest: Manifest, source: Box<dyn BundleSource>) -> Result<Self> {
        let slug = slugify(&manifest.metadata.name);
        let resources = source
            .entries()?
            .into_iter()
            .filter(|rel| rel != MANIFEST_FILE)
            .collect();
        Ok(Self {
            slug,
            manifest,
            source,
            resources,
        })
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Display name from the manifest.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.manifest.metadata.name
    }

    #[must_use]
    pub const fn metadata(&self) -> &SkillMetadata {
        &self.manifest.metadata
    }

    #[must_use]
    pub const fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Markdown instructions following the front matter.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.manifest.body
    }

    #[must_use]
    pub fn source(&self) -> &dyn BundleSource {
        self.source.as_ref()
    }

    #[must_use]
    pub fn locator(&self) -> &Path {
        self.source.locator()
    }

    #[must_use]
    pub fn is_archive(&self) -> bool {
        self.source.kind() == BundleKind::Archive
    }

    /// Resource-eligible relative paths (every file but the manifest), sorted.
    #[must_use]
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    #[must_use]
    pub fn has_resource(&self, rel: &str) -> bool {
        self.resources
            .binary_search_by(|candidate| candidate.as_str().cmp(rel))
            .is_ok()
    }

    /// Serializable view used by listing operations.
    #[must_use]
    pub fn summary(&self) -> SkillSummary {
        SkillSummary {
            slug: self.slug.clone(),
            name: self.manifest.metadata.name.clone(),
            description: self.manifest.metadata.description.clone(),
            license: self.manifest.metadata.license.clone(),
            allowed_tools: self.manifest.metadata.allowed_tools.clone(),
            extra: self.manifest.metadata.extra.clone(),
            kind: self.source.kind(),
            locator: self.locator().display().to_string(),
            resource_uris: self
                .resources
                .iter()
                .map(|rel| crate::resource::build_uri(&self.slug, rel))
                .collect(),
        }
    }
}

/// Metadata of a skill plus the URIs of its resources.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillSummary {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub license: Option<String>,
    pub allowed_tools: Vec<String>,
    pub extra: serde_json::Map<String, serde_json::Value>,
    pub kind: BundleKind,
    pub locator: String,
    pub resource_uris: Vec<String>,
}
