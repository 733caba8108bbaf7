//! Interpreter resolution for skill scripts.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, SkillzError};

/// Extensions with a known interpreter.
pub const SCRIPT_EXTENSIONS: &[&str] = &["py", "sh", "bash", "js", "ps1"];

const SHEBANG: &[u8] = b"#!";

#[must_use]
pub fn has_script_extension(rel: &str) -> bool {
    extension_of(rel).is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext.as_str()))
}

#[must_use]
pub fn starts_with_shebang(bytes: &[u8]) -> bool {
    bytes.starts_with(SHEBANG)
}

fn extension_of(rel: &str) -> Option<String> {
    Path::new(rel)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Interpreter command for a script extension.
fn extension_launcher(ext: &str) -> Option<Vec<String>> {
    let program = match ext {
        "py" => python_interpreter(),
        "sh" | "bash" => "bash",
        "js" => "node",
        "ps1" => {
            if which::which("pwsh").is_ok() {
                "pwsh"
            } else {
                "powershell"
            }
        }
        _ => return None,
    };
    Some(vec![program.to_string()])
}

const fn python_interpreter() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

/// First line of `path`, lossily decoded, without the line terminator.
fn first_line(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut line = Vec::new();
    reader.read_until(b'\n', &mut line)?;
    let line = String::from_utf8_lossy(&line);
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    extension_of(&path.to_string_lossy())
        .is_some_and(|ext| matches!(ext.as_str(), "exe" | "bat" | "cmd" | "com"))
}

/// Command vector that runs `script`, ending with the script path itself.
///
/// Tried in order: the shebang line, the extension table, direct execution.
/// `display` names the script in error messages.
pub fn resolve_command(script: &Path, display: &str) -> Result<Vec<String>> {
    let script_arg = script.to_string_lossy().to_string();

    let line = first_line(script)?;
    if let Some(rest) = line.strip_prefix("#!") {
        let tokens = shlex::split(rest.trim()).ok_or_else(|| {
            SkillzError::Execution(format!("Malformed shebang line in {display}: {line}"))
        })?;
        if !tokens.is_empty() {
            let mut command = tokens;
            command.push(script_arg);
            return Ok(command);
        }
    }

    if let Some(mut command) = extension_of(display)
        .as_deref()
        .and_then(extension_launcher)
    {
        command.push(script_arg);
        return Ok(command);
    }

    if is_executable(script) {
        return Ok(vec![script_arg]);
    }

    Err(SkillzError::Execution(format!(
        "Cannot determine interpreter for {display}. Add a shebang or known extension."
    )))
}
