//! Subcommand implementations

pub mod render;
pub mod serve;
pub mod warnings;
