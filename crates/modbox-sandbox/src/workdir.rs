//! Working directory populated from a fixture, with change notification.
//!
//! Edits made through [`Workdir`] are reported to registered watchers as
//! editor-protocol file events, so a client under test sees the same events it
//! would get from a real file watcher.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use modbox_fs::path_validation::resolve_under_root;

use crate::error::WorkdirError;

/// Editor protocol file change kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FileChangeType {
    Created = 1,
    Changed = 2,
    Deleted = 3,
}

impl From<FileChangeType> for u8 {
    fn from(t: FileChangeType) -> u8 {
        t as u8
    }
}

impl TryFrom<u8> for FileChangeType {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Self::Created),
            2 => Ok(Self::Changed),
            3 => Ok(Self::Deleted),
            other => Err(format!("unknown file change type {}", other)),
        }
    }
}

/// The protocol-level half of a [`FileEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolFileEvent {
    pub uri: String,
    #[serde(rename = "type")]
    pub kind: FileChangeType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEvent {
    pub path: PathBuf,
    pub protocol_event: ProtocolFileEvent,
}

impl FileEvent {
    pub fn new(path: impl Into<PathBuf>, kind: FileChangeType) -> Self {
        let path = path.into();
        let uri = to_uri(&path);
        Self {
            path,
            protocol_event: ProtocolFileEvent { uri, kind },
        }
    }
}

/// Receives batches of file events.
pub type Watcher = Arc<dyn Fn(&[FileEvent]) + Send + Sync>;

pub struct Workdir {
    root: PathBuf,
    watchers: Mutex<Vec<Watcher>>,
}

impl std::fmt::Debug for Workdir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workdir").field("root", &self.root).finish()
    }
}

impl Workdir {
    /// Write the fixture `text` under `dir`. No events are sent for the
    /// initial contents.
    pub fn new(dir: &Path, text: &str) -> Result<Self, WorkdirError> {
        let files = modbox_fs::unpack(text);
        modbox_fs::write_tree(dir, &files)?;
        tracing::debug!(dir = %dir.display(), files = files.len(), "populated workdir");
        Ok(Self {
            root: dir.to_path_buf(),
            watchers: Mutex::new(Vec::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn root_uri(&self) -> String {
        to_uri(&self.root)
    }

    /// Absolute path of a slash-separated path relative to the root.
    ///
    /// Paths that would leave the root are rejected, the same as fixture names.
    pub fn file_path(&self, rel: &str) -> Result<PathBuf, WorkdirError> {
        Ok(resolve_under_root(&self.root, rel)?)
    }

    pub fn uri_for(&self, rel: &str) -> Result<String, WorkdirError> {
        Ok(to_uri(&self.file_path(rel)?))
    }

    pub fn add_watcher<F>(&self, watcher: F)
    where
        F: Fn(&[FileEvent]) + Send + Sync + 'static,
    {
        self.lock_watchers().push(Arc::new(watcher));
    }

    /// Deliver `events` to every watcher in registration order.
    pub fn send_events(&self, events: &[FileEvent]) {
        if events.is_empty() {
            return;
        }
        // Snapshot so a watcher may register another watcher.
        let watchers: Vec<Watcher> = self.lock_watchers().clone();
        for watcher in &watchers {
            watcher(events);
        }
    }

    pub fn read_file(&self, rel: &str) -> Result<String, WorkdirError> {
        let path = self.file_path(rel)?;
        fs::read_to_string(&path).map_err(|source| WorkdirError::Io { path, source })
    }

    /// Write `content` and notify watchers with Created or Changed.
    pub fn write_file(&self, rel: &str, content: &str) -> Result<(), WorkdirError> {
        let path = self.file_path(rel)?;
        let existed = path.exists();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| WorkdirError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, content).map_err(|source| WorkdirError::Io {
            path: path.clone(),
            source,
        })?;
        let kind = if existed {
            FileChangeType::Changed
        } else {
            FileChangeType::Created
        };
        self.send_events(&[FileEvent::new(path, kind)]);
        Ok(())
    }

    /// Remove a file and notify watchers with Deleted.
    pub fn remove_file(&self, rel: &str) -> Result<(), WorkdirError> {
        let path = self.file_path(rel)?;
        fs::remove_file(&path).map_err(|source| WorkdirError::Io {
            path: path.clone(),
            source,
        })?;
        self.send_events(&[FileEvent::new(path, FileChangeType::Deleted)]);
        Ok(())
    }

    fn lock_watchers(&self) -> std::sync::MutexGuard<'_, Vec<Watcher>> {
        self.watchers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// `file://` URI for an absolute path.
pub fn to_uri(path: &Path) -> String {
    match url::Url::from_file_path(path) {
        Ok(url) => url.to_string(),
        Err(()) => format!("file://{}", path.to_string_lossy().replace('\\', "/")),
    }
}
