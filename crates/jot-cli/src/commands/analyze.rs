//! Analyze command: classification preview.
//!
//! Runs the full parse and rule evaluation for a capture and shows the
//! outcome without storing anything. Running it repeatedly over the same
//! text always yields the same answer for a given rule set.

use std::io::Write;

use anyhow::Result;

use jot_core::types::{ProjectName, TagName};
use jot_core::{DetailedAnalysis, Engine};

// ========== Human-Readable Output ==========

/// Format an analysis for human-readable output.
pub fn format_analysis(text: &str, detailed: &DetailedAnalysis) -> String {
    use std::fmt::Write as _;

    let analysis = &detailed.analysis;
    let mut output = String::new();

    let tags = if analysis.tags.is_empty() {
        "(none)".to_string()
    } else {
        analysis
            .tags
            .iter()
            .map(TagName::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let projects = if analysis.projects.is_empty() {
        "(none)".to_string()
    } else {
        analysis
            .projects
            .iter()
            .map(ProjectName::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let kind = analysis
        .suggested_kind
        .map_or("inbox", |kind| kind.as_str());

    writeln!(output, "Raw:      {text}").unwrap();
    writeln!(output, "Cleaned:  {}", analysis.cleaned_content).unwrap();
    writeln!(output, "Tags:     {tags}").unwrap();
    writeln!(output, "Projects: {projects}").unwrap();
    writeln!(output, "Kind:     {kind}").unwrap();
    if let Some(reason) = &analysis.suggested_reason {
        writeln!(output, "Reason:   {reason}").unwrap();
    }
    if let Some(rule) = &detailed.matched_rule {
        writeln!(output, "Rule:     {rule}").unwrap();
    }
    output
}

// ========== JSON Output ==========

/// Format an analysis as JSON.
pub fn format_analysis_json(detailed: &DetailedAnalysis) -> Result<String> {
    Ok(serde_json::to_string_pretty(detailed)?)
}

// ========== Public Interface ==========

/// Runs the analyze command.
pub fn run<W: Write>(writer: &mut W, engine: &Engine, text: &str, json: bool) -> Result<()> {
    let detailed = engine.analyze_detailed(text);

    if json {
        writeln!(writer, "{}", format_analysis_json(&detailed)?)?;
    } else {
        write!(writer, "{}", format_analysis(text, &detailed))?;
    }
    Ok(())
}
