//! CLI subcommands.

pub mod devices;
pub mod generate;
pub mod info;
pub mod play;
pub mod session;
