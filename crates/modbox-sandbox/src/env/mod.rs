//! Environment for commands run inside a sandbox.
//!
//! The sandbox computes paths; this module turns them into the ordered list of
//! variable assignments handed to the command runner.

pub mod builder;
