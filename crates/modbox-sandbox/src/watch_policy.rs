//! Synthesized file events for known command side effects.
//!
//! This is not file watching. Commands run in a sandbox may create files that
//! a client under test would otherwise learn about from a watcher; for the one
//! side effect we know about, `go mod init` writing `go.mod`, the event is
//! derived from the command's stderr instead.

use std::path::Path;

use crate::workdir::{FileChangeType, FileEvent};

/// Stderr prefix printed by `go mod init` after it writes `go.mod`.
pub const GO_MOD_CREATED_MARKER: &str = "go: creating new go.mod";

/// Map a finished command to the event its side effect would have produced.
///
/// Only the stderr marker decides; `verb` is carried for diagnostics.
pub fn synthesized_event(verb: &str, stderr: &str, workdir: &Path) -> Option<FileEvent> {
    if !stderr.starts_with(GO_MOD_CREATED_MARKER) {
        return None;
    }
    let modfile = workdir.join("go.mod");
    tracing::debug!(verb = %verb, path = %modfile.display(), "synthesizing go.mod creation event");
    Some(FileEvent::new(modfile, FileChangeType::Created))
}
