//! CLI subcommand implementations.

pub mod add;
pub mod analyze;
pub mod list;
pub mod projects;
pub mod rules;
pub mod tags;
