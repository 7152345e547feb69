//! Path validation utilities.
//!
//! Ensures fixture file names stay within the destination root to prevent
//! path traversal.

use std::path::{Component, Path, PathBuf};

use crate::error::{FixtureError, Result};

/// Validate a slash-separated fixture name and join it onto `root`.
///
/// Absolute names, Windows prefixes and `..` components are rejected; `.`
/// components are dropped.
pub fn resolve_under_root(root: &Path, name: &str) -> Result<PathBuf> {
    if name.trim().is_empty() {
        return Err(FixtureError::EmptyPath);
    }
    let mut full = root.to_path_buf();
    let mut pushed = false;
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => {
                full.push(part);
                pushed = true;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(FixtureError::UnsafePath(name.to_string()));
            }
        }
    }
    if !pushed {
        return Err(FixtureError::EmptyPath);
    }
    Ok(full)
}
