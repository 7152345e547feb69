use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FixtureError, Result};
use crate::path_validation::resolve_under_root;

/// Write every entry of `files` under `root`, creating parent directories.
///
/// Content is written byte for byte. Returns the absolute paths written, in
/// name order.
pub fn write_tree(root: &Path, files: &BTreeMap<String, Vec<u8>>) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());
    for (name, data) in files {
        let full = resolve_under_root(root, name)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|source| FixtureError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&full, data).map_err(|source| FixtureError::Write {
            path: full.clone(),
            source,
        })?;
        tracing::trace!(path = %full.display(), bytes = data.len(), "wrote fixture file");
        written.push(full);
    }
    Ok(written)
}
