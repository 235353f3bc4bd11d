//! Quick-capture CLI library.
//!
//! This crate provides the CLI interface for jot.

mod cli;
pub mod commands;
mod config;
pub mod rulefile;

pub use cli::{Cli, Commands, RulesAction};
pub use config::Config;
