//! Command-line interface for songstore.
//!
//! Commands for importing a music directory into the media index and for
//! exercising track lookup, cover resolution and random selection.

mod commands;

pub use commands::{Cli, Commands, run_command};
