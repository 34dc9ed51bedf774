//! Tooling & Integration Layer
//!
//! Command-line adapter and text rendering over the catalog engine.

pub mod cli;
pub mod format;

pub use cli::{AddressArgs, Cli, CliContext, Commands};
