use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FixtureError>;

/// Errors returned while populating a directory from a fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("fixture path '{0}' escapes the destination root")]
    UnsafePath(String),

    #[error("fixture path is empty")]
    EmptyPath,

    #[error("writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
