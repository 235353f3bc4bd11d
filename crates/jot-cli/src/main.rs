use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jot_cli::commands::{add, analyze, list, projects, rules, tags};
use jot_cli::{Cli, Commands, Config, RulesAction, rulefile};
use jot_core::Engine;
use jot_core::types::ItemKind;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(jot_db::Database, Config)> {
    let config = load_config(config_path)?;

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = jot_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

/// Build the classification engine from the configured rules file.
fn load_engine(config: &Config) -> Result<Engine> {
    let rules = rulefile::load_rules(&config.rules_path)?;
    Ok(Engine::new(rules))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Add { text, task, note }) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            let engine = load_engine(&config)?;
            let kind_override = if *task {
                Some(ItemKind::Task)
            } else if *note {
                Some(ItemKind::Note)
            } else {
                None
            };
            add::run(&mut out, db, &engine, text, kind_override).await?;
        }
        Some(Commands::Analyze { text, json }) => {
            // Analyze never touches the database
            let config = load_config(cli.config.as_deref())?;
            let engine = load_engine(&config)?;
            analyze::run(&mut out, &engine, text, *json)?;
        }
        Some(Commands::List { json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            list::run(&mut out, &db, *json)?;
        }
        Some(Commands::Tags) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            tags::run(&mut out, &db)?;
        }
        Some(Commands::Projects) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            projects::run(&mut out, &db)?;
        }
        Some(Commands::Rules { action }) => {
            let config = load_config(cli.config.as_deref())?;
            match action {
                RulesAction::List { json } => {
                    let engine = load_engine(&config)?;
                    rules::run_list(&mut out, &engine, *json)?;
                }
                RulesAction::Test { text, json } => {
                    let engine = load_engine(&config)?;
                    rules::run_test(&mut out, &engine, text, *json)?;
                }
                RulesAction::Stats => {
                    let engine = load_engine(&config)?;
                    rules::run_stats(&mut out, &engine)?;
                }
                RulesAction::Reload => {
                    // Start from the built-ins so a reload is observable as a
                    // new generation.
                    let engine = Engine::default();
                    rules::run_reload(&mut out, &engine, &config.rules_path)?;
                }
            }
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
