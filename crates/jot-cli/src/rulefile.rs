//! Classification rule file loading.
//!
//! Rules live in a TOML file as an array of `[[rules]]` tables. A missing
//! file is not an error; the built-in rules apply instead. A file that
//! exists but does not parse is an error, so a bad edit never silently
//! drops the configured rules.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use jot_core::rules::{ClassificationRule, default_rules};

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<ClassificationRule>,
}

/// Loads classification rules from a TOML file.
pub fn load_rules(path: &Path) -> Result<Vec<ClassificationRule>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no rules file, using built-in rules");
        return Ok(default_rules());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file: RuleFile =
        toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))?;
    tracing::debug!(path = %path.display(), rules = file.rules.len(), "loaded rules file");
    Ok(file.rules)
}
