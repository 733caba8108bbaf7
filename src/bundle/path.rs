//! Bundle-relative path hygiene.

use std::path::Path;

/// Per-directory metadata that archivers and file managers leave behind.
const JUNK_DIRS: &[&str] = &["__MACOSX"];
const JUNK_FILES: &[&str] = &[".DS_Store"];

/// Normalize a bundle-relative path to `a/b/c` form.
///
/// `.` and empty segments are dropped and `..` pops a segment. Returns `None`
/// when the path is absolute or climbs above the bundle root. Both `/` and
/// `\` count as separators.
#[must_use]
pub fn normalize_relative(raw: &str) -> Option<String> {
    if raw.starts_with('/') || raw.starts_with('\\') || Path::new(raw).is_absolute() {
        return None;
    }
    if raw.contains('\0') {
        return None;
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

/// Whether a normalized relative path is system metadata rather than content.
#[must_use]
pub fn is_junk(rel: &str) -> bool {
    rel.split('/').any(|segment| JUNK_DIRS.contains(&segment))
        || rel
            .rsplit('/')
            .next()
            .is_some_and(|name| JUNK_FILES.contains(&name))
}
