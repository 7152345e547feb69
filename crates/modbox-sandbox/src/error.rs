use std::path::PathBuf;

use modbox_fs::FixtureError;
use thiserror::Error;

/// Errors returned by sandbox construction, commands and teardown.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("creating temporary root: {0}")]
    CreateRoot(#[source] std::io::Error),

    #[error("creating {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("initializing proxy: {0}")]
    Proxy(#[source] ProxyError),

    #[error("initializing workdir: {0}")]
    Workdir(#[source] WorkdirError),

    #[error(transparent)]
    Command(#[from] CommandError),

    /// Both teardown steps always run; either failure may be present.
    #[error(
        "error(s) cleaning sandbox: cleaning modcache: {}; removing files: {}",
        display_opt(.clean),
        display_opt(.remove)
    )]
    Teardown {
        clean: Option<CommandError>,
        remove: Option<std::io::Error>,
    },
}

/// Failure of a command run through a [`crate::CommandRunner`].
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("starting {program} {verb}: {source}")]
    Spawn {
        program: String,
        verb: String,
        #[source]
        source: std::io::Error,
    },

    #[error("waiting for {program} {verb}: {source}")]
    Wait {
        program: String,
        verb: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} {verb}: {}: {stderr}", describe_exit(.code))]
    Exit {
        program: String,
        verb: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} {verb}: cancelled")]
    Cancelled { program: String, verb: String },
}

impl CommandError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid module path '{0}' in proxy fixture")]
    InvalidModulePath(String),

    #[error("writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing {}: {source}", .path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("encoding version info: {0}")]
    Info(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum WorkdirError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_opt<E: std::fmt::Display>(err: &Option<E>) -> String {
    match err {
        Some(e) => e.to_string(),
        None => "<nil>".to_string(),
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}
