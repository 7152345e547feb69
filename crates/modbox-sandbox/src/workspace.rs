//! Temporary directory tree owned by one sandbox.
//!
//! ```text
//! <temp>/modbox-sandbox-<name>-XXXXXX/
//!     cache/   GOPATH and module cache
//!     work/    working directory
//!     proxy/   file-backed module proxy
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::SandboxError;

pub const CACHE_DIR: &str = "cache";
pub const WORK_DIR: &str = "work";
pub const PROXY_DIR: &str = "proxy";

const SUBDIRS: [&str; 3] = [CACHE_DIR, WORK_DIR, PROXY_DIR];

/// The allocated root and its three subdirectories.
///
/// The root carries a random suffix, so sandboxes never share a tree. It is
/// removed by [`WorkspaceDirs::remove`]; dropping without removing also purges
/// it on a best-effort basis.
#[derive(Debug)]
pub struct WorkspaceDirs {
    root: TempDir,
    pub gopath: PathBuf,
    pub work: PathBuf,
    pub proxy: PathBuf,
}

impl WorkspaceDirs {
    /// Create a uniquely named root under `parent` and its subdirectories.
    ///
    /// Either the whole tree exists afterwards or nothing does.
    pub fn allocate(parent: &Path, name: &str) -> Result<Self, SandboxError> {
        let root = allocate_with(parent, name, &SUBDIRS)?;
        let base = root.path().to_path_buf();
        Ok(Self {
            root,
            gopath: base.join(CACHE_DIR),
            work: base.join(WORK_DIR),
            proxy: base.join(PROXY_DIR),
        })
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Recursively remove the whole tree.
    pub fn remove(self) -> io::Result<()> {
        self.root.close()
    }
}

/// Creation steps paired with their undo, run in reverse on failure.
struct Rollback {
    root: TempDir,
    dirs: Vec<PathBuf>,
}

impl Rollback {
    fn unwind(self) {
        let Rollback { root, mut dirs } = self;
        while let Some(dir) = dirs.pop() {
            if let Err(e) = fs::remove_dir_all(&dir) {
                tracing::warn!(dir = %dir.display(), error = %e, "rollback: removing subdirectory failed");
            }
        }
        let path = root.path().to_path_buf();
        if let Err(e) = root.close() {
            tracing::warn!(root = %path.display(), error = %e, "rollback: removing root failed");
        }
    }
}

fn allocate_with(
    parent: &Path,
    name: &str,
    subdirs: &[&str],
) -> Result<TempDir, SandboxError> {
    let root = tempfile::Builder::new()
        .prefix(&format!("modbox-sandbox-{}-", sanitize_name(name)))
        .tempdir_in(parent)
        .map_err(SandboxError::CreateRoot)?;
    let root_path = root.path().to_path_buf();
    let mut rollback = Rollback {
        root,
        dirs: Vec::with_capacity(subdirs.len()),
    };
    for subdir in subdirs {
        let path = root_path.join(subdir);
        if let Err(source) = fs::create_dir(&path) {
            rollback.unwind();
            return Err(SandboxError::CreateDir { path, source });
        }
        rollback.dirs.push(path);
    }
    tracing::debug!(root = %root_path.display(), "allocated sandbox root");
    Ok(rollback.root)
}

/// Keep names readable in temp listings while staying a single path component.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
