//! Fixture archives for modbox.
//!
//! A fixture is a txtar text archive: a free-form comment followed by files
//! introduced by `-- name --` marker lines. [`unpack`] turns fixture text into
//! a name→bytes map and [`write_tree`] materializes that map under a root
//! directory.

pub mod error;
pub mod path_validation;
pub mod tree;
pub mod txtar;

pub use error::{FixtureError, Result};
pub use tree::write_tree;
pub use txtar::{unpack, Archive, ArchiveFile};
