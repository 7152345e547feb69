//! Disposable sandboxes for running Go commands against synthetic modules.
//!
//! A [`Sandbox`] owns a private temporary root with three subdirectories: a
//! module cache (`GOPATH`), a working directory populated from a fixture, and a
//! file-backed module proxy populated from a second fixture. Commands run with
//! an environment that points only at those directories.

pub mod env;
pub mod error;
pub mod log;
pub mod proxy;
pub mod runner;
pub mod sandbox;
pub mod watch_policy;
pub mod workdir;
pub mod workspace;

pub use error::{CommandError, ProxyError, SandboxError, WorkdirError};
pub use proxy::Proxy;
pub use runner::{CommandRunner, GoCommandRunner, Invocation, RawOutput, RawRun};
pub use sandbox::{Sandbox, SandboxConfig};
pub use workdir::{FileChangeType, FileEvent, ProtocolFileEvent, Workdir};
pub use workspace::WorkspaceDirs;
