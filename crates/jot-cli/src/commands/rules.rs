//! Rules admin commands: list, test, stats, and reload.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use anyhow::Result;

use jot_core::rules::{RuleCondition, RuleSet};
use jot_core::types::ItemKind;
use jot_core::{DetailedAnalysis, Engine};

use crate::rulefile;

// ========== Condition Display ==========

fn summarize_condition(condition: &RuleCondition) -> String {
    match condition {
        RuleCondition::Keyword { any } => format!("keyword({})", any.join(", ")),
        RuleCondition::Regex { pattern } => format!("regex({pattern})"),
        RuleCondition::BareUrl => "bare_url".to_string(),
        RuleCondition::ContainsUrl => "contains_url".to_string(),
        RuleCondition::Length { at_least, at_most } => match (at_least, at_most) {
            (Some(lo), Some(hi)) => format!("length({lo}..={hi})"),
            (Some(lo), None) => format!("length({lo}..)"),
            (None, Some(hi)) => format!("length(..={hi})"),
            (None, None) => "length(unbounded)".to_string(),
        },
        RuleCondition::MinTags { count } => format!("min_tags({count})"),
    }
}

// ========== List ==========

/// Format the rule set for human-readable output, in evaluation order.
pub fn format_rules(set: &RuleSet) -> String {
    use std::fmt::Write as _;

    let mut output = String::new();
    writeln!(output, "RULES (generation {})", set.generation()).unwrap();
    writeln!(output).unwrap();

    if set.is_empty() {
        writeln!(output, "No rules loaded.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:>8}  {:<15}  {:<6}  {:<14}  Conditions",
        "Priority", "Id", "Action", "Reason"
    )
    .unwrap();
    for rule in set.rules() {
        let conditions = rule
            .conditions
            .iter()
            .map(summarize_condition)
            .collect::<Vec<_>>()
            .join(" AND ");
        writeln!(
            output,
            "{:>8}  {:<15}  {:<6}  {:<14}  {}",
            rule.priority,
            rule.id,
            rule.action.kind.as_str(),
            rule.action.reason,
            conditions
        )
        .unwrap();
    }
    output
}

/// Format the rule set as JSON, in evaluation order.
pub fn format_rules_json(set: &RuleSet) -> Result<String> {
    let rules: Vec<_> = set.rules().collect();
    Ok(serde_json::to_string_pretty(&rules)?)
}

/// Runs the rules list command.
pub fn run_list<W: Write>(writer: &mut W, engine: &Engine, json: bool) -> Result<()> {
    let set = engine.snapshot();
    if json {
        writeln!(writer, "{}", format_rules_json(&set)?)?;
    } else {
        write!(writer, "{}", format_rules(&set))?;
    }
    Ok(())
}

// ========== Test ==========

/// Format a rule test outcome for human-readable output.
pub fn format_test(text: &str, detailed: &DetailedAnalysis) -> String {
    use std::fmt::Write as _;

    let mut output = String::new();
    writeln!(output, "Input:    {text}").unwrap();
    writeln!(output, "Cleaned:  {}", detailed.analysis.cleaned_content).unwrap();
    match &detailed.matched_rule {
        Some(rule) => {
            writeln!(output, "Matched:  {rule}").unwrap();
            let kind = detailed
                .analysis
                .suggested_kind
                .map_or("inbox", |kind| kind.as_str());
            writeln!(output, "Kind:     {kind}").unwrap();
            if let Some(reason) = &detailed.analysis.suggested_reason {
                writeln!(output, "Reason:   {reason}").unwrap();
            }
        }
        None => {
            writeln!(output, "Matched:  (none)").unwrap();
            writeln!(output, "Kind:     inbox").unwrap();
        }
    }
    output
}

/// Runs the rules test command.
pub fn run_test<W: Write>(writer: &mut W, engine: &Engine, text: &str, json: bool) -> Result<()> {
    let detailed = engine.analyze_detailed(text);
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&detailed)?)?;
    } else {
        write!(writer, "{}", format_test(text, &detailed))?;
    }
    Ok(())
}

// ========== Stats ==========

/// Format a summary of the rule set.
pub fn format_stats(set: &RuleSet) -> String {
    use std::fmt::Write as _;

    let task_rules = set
        .rules()
        .filter(|rule| rule.action.kind == ItemKind::Task)
        .count();
    let note_rules = set
        .rules()
        .filter(|rule| rule.action.kind == ItemKind::Note)
        .count();
    let reasons: BTreeSet<&str> = set.rules().map(|rule| rule.action.reason.as_str()).collect();
    let reasons = if reasons.is_empty() {
        "(none)".to_string()
    } else {
        reasons.into_iter().collect::<Vec<_>>().join(", ")
    };

    let mut output = String::new();
    writeln!(output, "RULE SET (generation {})", set.generation()).unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Rules:      {}", set.len()).unwrap();
    writeln!(output, "Task rules: {task_rules}").unwrap();
    writeln!(output, "Note rules: {note_rules}").unwrap();
    writeln!(output, "Reasons:    {reasons}").unwrap();
    output
}

/// Runs the rules stats command.
pub fn run_stats<W: Write>(writer: &mut W, engine: &Engine) -> Result<()> {
    let set = engine.snapshot();
    write!(writer, "{}", format_stats(&set))?;
    Ok(())
}

// ========== Reload ==========

/// Runs the rules reload command.
///
/// Loads the rules file and installs it as a new generation. A file that
/// fails to load is an error and leaves the running rule set untouched.
pub fn run_reload<W: Write>(writer: &mut W, engine: &Engine, rules_path: &Path) -> Result<()> {
    let rules = rulefile::load_rules(rules_path)?;
    let installed = engine.install(rules);
    writeln!(
        writer,
        "Installed {} rules (generation {})",
        installed.len(),
        installed.generation()
    )?;
    Ok(())
}
