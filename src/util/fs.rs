//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Canonicalize a path, but don't fail if it doesn't exist yet.
/// Returns the path as-is if canonicalization fails.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Canonicalize a path that may not exist yet.
///
/// The nearest existing ancestor is canonicalized and the missing tail is
/// appended unchanged.
pub fn canonicalize_lenient(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("error getting canonical path for {}", path.display()))?;

    let mut existing = absolute.as_path();
    let mut tail = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }

    let mut canonical = existing
        .canonicalize()
        .with_context(|| format!("error getting canonical path for {}", path.display()))?;
    for name in tail.into_iter().rev() {
        canonical.push(name);
    }
    Ok(canonical)
}

/// Check if a path is inside another path.
fn is_inside(path: &Path, parent: &Path) -> bool {
    path.starts_with(parent)
}

/// Validate a source/output directory pair before generating a build tree.
///
/// The source directory must not live inside the output directory, or
/// cleaning the output would destroy it. Symlinks and hardlinks can still
/// defeat this check.
pub fn validate_params(output: &Path, source: &Path) -> Result<()> {
    let output = canonicalize_lenient(output).context("error getting canonical path for output")?;
    let source = canonicalize_lenient(source).context("error getting canonical path for source")?;

    if is_inside(&source, &output) {
        bail!(
            "the source directory `{}` must not be inside the output directory `{}` \
             (it would be destroyed when the output is cleaned)",
            source.display(),
            output.display()
        );
    }
    Ok(())
}
