//! Script persistence and execution for dare
//!
//! This crate saves an extracted [`Artifact`] to disk, reads its PEP 723
//! metadata, and runs it (or a script being fixed) through a runner command.

use anyhow::{anyhow, Context, Result};
use dare_core::Artifact;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub mod metadata;
pub mod runner;

pub use metadata::{parse_script_metadata, ScriptMetadata};
pub use runner::{RunOutcome, Runner};

/// Check that a name from a model reply is a single plain file name.
pub fn validate_script_name(name: &str) -> Result<()> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(anyhow!("Script name is empty"));
    }

    // Security: the name comes from model output; keep it inside the output dir
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(anyhow!(
            "Invalid script name '{}': must not contain path separators",
            name
        ));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(anyhow!("Invalid script name '{}'", name));
    }
    if trimmed != name {
        return Err(anyhow!(
            "Invalid script name '{}': leading or trailing whitespace",
            name
        ));
    }

    Ok(())
}

/// Where `name` lands inside `dir` (a bare name when `dir` is `.`).
pub fn script_path(dir: &Path, name: &str) -> PathBuf {
    if dir == Path::new(".") {
        PathBuf::from(name)
    } else {
        dir.join(name)
    }
}

/// Write the artifact's content verbatim to `<dir>/<name>`.
pub fn save_artifact(dir: &Path, artifact: &Artifact) -> Result<PathBuf> {
    validate_script_name(&artifact.name)?;

    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        info!("Created output directory: {}", dir.display());
    }

    let path = script_path(dir, &artifact.name);
    if path.exists() {
        warn!("Overwriting existing file: {}", path.display());
    }

    fs::write(&path, &artifact.content)
        .with_context(|| format!("Failed to write script: {}", path.display()))?;
    make_executable(&path)?;

    info!(
        "Saved {} ({} lines) to {}",
        artifact.name,
        artifact.line_count(),
        path.display()
    );
    Ok(path)
}

/// Read a script for fix mode.
pub fn read_script(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(anyhow!("Script not found: {}", path.display()));
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read script: {}", path.display()))
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    // Windows: Files are executable by extension
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn artifact(name: &str, content: &str) -> Artifact {
        Artifact::new(name, Some("py".to_string()), content)
    }

    #[test]
    fn test_save_writes_content_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let content = "# /// script\n# ///\nprint(\"hi\")\r\n\n  \n";

        let path = save_artifact(temp_dir.path(), &artifact("hi.py", content)).unwrap();

        assert_eq!(path, temp_dir.path().join("hi.py"));
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("scripts").join("generated");

        let path = save_artifact(&nested, &artifact("a.py", "print(1)\n")).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        save_artifact(temp_dir.path(), &artifact("a.py", "old\n")).unwrap();
        let path = save_artifact(temp_dir.path(), &artifact("a.py", "new\n")).unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "new\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_script_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = save_artifact(temp_dir.path(), &artifact("x.py", "print(1)\n")).unwrap();
        let mode = fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn test_script_name_validation_rejects_path_separators() {
        for name in ["../etc/passwd", "a/b.py", "..\\evil.py", "/abs.py"] {
            assert!(validate_script_name(name).is_err(), "{} should be rejected", name);
        }
    }

    #[test]
    fn test_script_name_validation_rejects_empty_and_dots() {
        for name in ["", "   ", ".", "..", " padded.py"] {
            assert!(validate_script_name(name).is_err(), "{:?} should be rejected", name);
        }
        assert!(validate_script_name("my script.py").is_ok());
        assert!(validate_script_name(".hidden.py").is_ok());
    }

    #[test]
    fn test_invalid_name_is_not_written() {
        let temp_dir = TempDir::new().unwrap();
        let err = save_artifact(temp_dir.path(), &artifact("../escape.py", "x\n")).unwrap_err();
        assert!(err.to_string().contains("path separators"));
        assert!(!temp_dir.path().parent().unwrap().join("escape.py").exists());
    }

    #[test]
    fn test_script_path_for_current_dir() {
        assert_eq!(script_path(Path::new("."), "a.py"), PathBuf::from("a.py"));
        assert_eq!(script_path(Path::new("out"), "a.py"), PathBuf::from("out/a.py"));
    }

    #[test]
    fn test_read_script_missing() {
        let err = read_script(Path::new("/nonexistent/tool.py")).unwrap_err();
        assert!(err.to_string().contains("Script not found"));
    }
}
