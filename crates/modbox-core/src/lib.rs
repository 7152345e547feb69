pub mod config;
pub mod module_path;
pub mod observability;
