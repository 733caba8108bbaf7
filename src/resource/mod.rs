//! Resource identifiers and resource reads.
//!
//! Every non-manifest file of a skill is addressable as
//! `resource://skillz/<slug>/<segment>/<segment>...` where the slug and each
//! path segment are percent-encoded independently.

mod miss;
mod runnable;

use serde::Serialize;
use tracing::warn;

pub use miss::{MissPayload, ResourceMiss};
pub use runnable::{ensure_runnable, is_runnable};

use crate::bundle::normalize_relative;
use crate::encoding::EncodedContent;
use crate::error::SkillzError;
use crate::registry::{Skill, SkillRegistry};

/// Scheme and namespace shared by every resource URI.
pub const SCHEME_PREFIX: &str = "resource://skillz/";

/// A decoded resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceAddress {
    pub slug: String,
    /// Normalized bundle-relative path; empty for the skill root.
    pub path: String,
}

/// Listing entry for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceEntry {
    pub uri: String,
    pub name: String,
    pub mime_type: Option<String>,
}

/// Content of a resource read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceContent {
    pub uri: String,
    pub name: String,
    pub mime_type: Option<String>,
    #[serde(flatten)]
    pub payload: EncodedContent,
}

/// Build the URI for `rel` inside the skill `slug`.
#[must_use]
pub fn build_uri(slug: &str, rel: &str) -> String {
    let mut uri = format!("{SCHEME_PREFIX}{}", urlencoding::encode(slug));
    if !rel.is_empty() {
        for segment in rel.split('/') {
            uri.push('/');
            uri.push_str(&urlencoding::encode(segment));
        }
    }
    uri
}

/// Display name of a resource: `<slug>/<path>`.
#[must_use]
pub fn resource_name(slug: &str, rel: &str) -> String {
    format!("{slug}/{rel}")
}

/// Decode a resource URI into its slug and bundle-relative path.
pub fn resolve_uri(uri: &str) -> Result<ResourceAddress, ResourceMiss> {
    let rest = uri
        .strip_prefix(SCHEME_PREFIX)
        .ok_or(ResourceMiss::UnsupportedPrefix)?;
    let (raw_slug, raw_path) = rest.split_once('/').unwrap_or((rest, ""));

    let slug = urlencoding::decode(raw_slug).map_err(|_| ResourceMiss::InvalidFormat)?;
    if slug.trim().is_empty() || slug.contains('/') {
        return Err(ResourceMiss::InvalidFormat);
    }

    let segments = raw_path
        .split('/')
        .map(|segment| urlencoding::decode(segment).map_err(|_| ResourceMiss::InvalidFormat))
        .collect::<Result<Vec<_>, _>>()?;
    let path = normalize_relative(&segments.join("/")).ok_or(ResourceMiss::PathTraversal)?;

    Ok(ResourceAddress {
        slug: slug.into_owned(),
        path,
    })
}

/// Guess a MIME type from the file extension.
#[must_use]
pub fn guess_mime(rel: &str) -> Option<String> {
    mime_guess::from_path(rel).first().map(|mime| mime.to_string())
}

/// Resource listing of one skill, in path order.
#[must_use]
pub fn entries(skill: &Skill) -> Vec<ResourceEntry> {
    skill
        .resources()
        .iter()
        .map(|rel| ResourceEntry {
            uri: build_uri(skill.slug(), rel),
            name: resource_name(skill.slug(), rel),
            mime_type: guess_mime(rel),
        })
        .collect()
}

/// Read the resource named by `uri`.
///
/// Every failure is a [`ResourceMiss`]; nothing here is fatal to the caller.
pub fn read_resource(registry: &SkillRegistry, uri: &str) -> Result<ResourceContent, ResourceMiss> {
    let address = resolve_uri(uri)?;
    let skill = registry
        .find(&address.slug)
        .ok_or_else(|| ResourceMiss::SkillNotFound(address.slug.clone()))?;
    if address.path.is_empty() || !skill.has_resource(&address.path) {
        return Err(ResourceMiss::ResourceNotFound(address.path));
    }

    let bytes = match skill.source().read(&address.path) {
        Ok(bytes) => bytes,
        Err(SkillzError::Resource(miss)) => return Err(miss),
        Err(err) => {
            warn!(uri, error = %err, "Failed to read resource");
            return Err(ResourceMiss::ResourceNotFound(address.path));
        }
    };

    Ok(ResourceContent {
        uri: build_uri(skill.slug(), &address.path),
        name: resource_name(skill.slug(), &address.path),
        mime_type: guess_mime(&address.path),
        payload: EncodedContent::from_bytes(bytes),
    })
}
