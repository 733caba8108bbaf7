use super::build_uri;
use crate::bundle::MANIFEST_FILE;
use crate::error::{Result, SkillzError};
use crate::registry::Skill;
use crate::sandbox::launcher::{has_script_extension, starts_with_shebang};

/// Whether `rel` may be handed to the sandbox.
///
/// The manifest never is. Otherwise a file qualifies by shebang, by a known
/// script extension, or, on disk, by its executable bit.
#[must_use]
pub fn is_runnable(skill: &Skill, rel: &str) -> bool {
    if rel == MANIFEST_FILE || !skill.source().contains(rel) {
        return false;
    }
    if has_script_extension(rel) {
        return true;
    }
    if skill
        .source()
        .read(rel)
        .is_ok_and(|bytes| starts_with_shebang(&bytes))
    {
        return true;
    }
    skill.source().is_executable(rel)
}

/// Fail with a pointer at the resource read path when `rel` is not a script.
pub fn ensure_runnable(skill: &Skill, rel: &str) -> Result<()> {
    if is_runnable(skill, rel) {
        Ok(())
    } else {
        Err(SkillzError::NotRunnable {
            path: rel.to_string(),
            uri: build_uri(skill.slug(), rel),
        })
    }
}
