use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use crate::bundle::MANIFEST_FILE;

const SCRIPT_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o644;

/// One skill to author on disk or in an archive.
#[derive(Debug, Clone)]
pub struct SkillSpec {
    dir_name: String,
    manifest: String,
    files: Vec<(String, Vec<u8>, u32)>,
}

impl SkillSpec {
    /// Skill with a minimal valid header.
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            dir_name: name.to_string(),
            manifest: format!("---\nname: {name}\ndescription: {description}\n---\n"),
            files: Vec::new(),
        }
    }

    /// Replace the whole manifest text.
    #[must_use]
    pub fn manifest(mut self, raw: &str) -> Self {
        self.manifest = raw.to_string();
        self
    }

    #[must_use]
    pub fn body(mut self, body: &str) -> Self {
        self.manifest.push_str(body);
        self
    }

    /// Directory (or archive stem) name; defaults to the skill name.
    #[must_use]
    pub fn dir_name(mut self, name: &str) -> Self {
        self.dir_name = name.to_string();
        self
    }

    #[must_use]
    pub fn file(mut self, path: &str, content: impl AsRef<[u8]>) -> Self {
        self.files.push((path.to_string(), content.as_ref().to_vec(), FILE_MODE));
        self
    }

    /// File with the executable bit set.
    #[must_use]
    pub fn script(mut self, path: &str, content: &str) -> Self {
        self.files.push((path.to_string(), content.as_bytes().to_vec(), SCRIPT_MODE));
        self
    }
}

/// A temporary skills root.
pub struct SkillFixture {
    pub temp_dir: TempDir,
    root: PathBuf,
}

impl Default for SkillFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("skills");
        fs::create_dir_all(&root).expect("Failed to create skills root");

        println!("[FIXTURE] Created skills root: {root:?}");

        Self { temp_dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `spec` as a directory skill.
    pub fn write_dir(&self, spec: &SkillSpec) -> PathBuf {
        let dir = self.root.join(&spec.dir_name);
        write_file(&dir.join(MANIFEST_FILE), spec.manifest.as_bytes(), FILE_MODE);
        for (path, content, mode) in &spec.files {
            write_file(&dir.join(path), content, *mode);
        }
        println!("[FIXTURE] Created skill directory: {dir:?}");
        dir
    }

    /// Write `spec` as `<dir_name>.zip`, optionally under one wrapper directory.
    pub fn write_archive(&self, spec: &SkillSpec, wrapper: Option<&str>) -> PathBuf {
        let path = self.root.join(format!("{}.zip", spec.dir_name));
        let mut entries = vec![(MANIFEST_FILE.to_string(), spec.manifest.as_bytes().to_vec(), FILE_MODE)];
        entries.extend(spec.files.iter().cloned());
        let entries: Vec<_> = entries
            .into_iter()
            .map(|(name, content, mode)| match wrapper {
                Some(prefix) => (format!("{prefix}/{name}"), content, mode),
                None => (name, content, mode),
            })
            .collect();
        write_zip(&path, &entries);
        println!("[FIXTURE] Created skill archive: {path:?}");
        path
    }

    /// Write a raw file directly under the root.
    pub fn write_raw(&self, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.root.join(name);
        write_file(&path, content.as_ref(), FILE_MODE);
        path
    }
}

impl Drop for SkillFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up skills root: {:?}", self.root);
    }
}

/// Write a zip whose entries are `(name, content, unix mode)`.
pub fn write_zip(path: &Path, entries: &[(String, Vec<u8>, u32)]) {
    let file = fs::File::create(path).expect("Failed to create archive");
    let mut zip = zip::ZipWriter::new(file);
    for (name, content, mode) in entries {
        let options = SimpleFileOptions::default().unix_permissions(*mode);
        zip.start_file(name.as_str(), options).expect("Failed to start archive entry");
        zip.write_all(content).expect("Failed to write archive entry");
    }
    zip.finish().expect("Failed to finish archive");
}

fn write_file(path: &Path, content: &[u8], mode: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dirs");
    }
    fs::write(path, content).expect("Failed to write file");
    set_mode(path, mode);
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).expect("Failed to set permissions");
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) {}
