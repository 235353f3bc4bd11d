//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Quick capture for tasks, notes, and bookmarks.
///
/// Text is parsed for `#tag` and `+project` markers, classified by a
/// priority-ordered rule set, and stored for later triage.
#[derive(Debug, Parser)]
#[command(name = "jot", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Capture a new item.
    Add {
        /// The text to capture. Markers at the edges become tags and
        /// projects, e.g. `jot add "#work +Health call the dentist"`.
        text: String,

        /// Store as a task regardless of what the rules suggest.
        #[arg(long, conflicts_with = "note")]
        task: bool,

        /// Store as a note regardless of what the rules suggest.
        #[arg(long)]
        note: bool,
    },

    /// Show how a capture would be parsed and classified, without saving it.
    Analyze {
        /// The text to analyze.
        text: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List captured items, newest first.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List known tags.
    Tags,

    /// List known projects.
    Projects,

    /// Inspect and manage classification rules.
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

/// Rule administration subcommands.
#[derive(Debug, Subcommand)]
pub enum RulesAction {
    /// List the loaded rules in evaluation order.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Run the rules against a capture without saving anything.
    Test {
        /// The text to classify.
        text: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Summarize the loaded rule set.
    Stats,

    /// Reload rules from the configured rules file.
    Reload,
}
