//! List command for showing captured items.

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

use jot_core::{display_project, display_tag};
use jot_db::{Database, ItemRecord};

// ========== Item Data ==========

/// Item data for display.
#[derive(Debug, Clone, Serialize)]
pub struct ItemEntry {
    pub id: String,
    pub id_short: String,
    pub kind: String,
    pub content: String,
    pub raw_content: String,
    pub tags: Vec<String>,
    pub projects: Vec<String>,
    pub suggested_reason: Option<String>,
    pub created_at: String,
}

impl From<ItemRecord> for ItemEntry {
    fn from(item: ItemRecord) -> Self {
        let id_short: String = item.id.chars().take(6).collect();
        Self {
            id: item.id,
            id_short,
            kind: item.kind,
            content: item.content,
            raw_content: item.raw_content,
            tags: item.tags,
            projects: item.projects,
            suggested_reason: item.suggested_reason,
            created_at: item.created_at,
        }
    }
}

/// Get items for display, newest first.
pub fn get_items_for_display(db: &Database) -> Result<Vec<ItemEntry>> {
    let items = db.list_items()?;
    Ok(items.into_iter().map(ItemEntry::from).collect())
}

// ========== Human-Readable Output ==========

/// Format items for human-readable output.
pub fn format_items(entries: &[ItemEntry]) -> String {
    use std::fmt::Write as _;

    let mut output = String::new();

    writeln!(output, "ITEMS").unwrap();
    writeln!(output).unwrap();

    if entries.is_empty() {
        writeln!(output, "Nothing captured yet.").unwrap();
        writeln!(output).unwrap();
        writeln!(output, "Hint: Run 'jot add \"<text>\"' to capture your first item.").unwrap();
        return output;
    }

    // Header
    writeln!(
        output,
        "{:<6}  {:<5}  {:<24}  {:<30}  Labels",
        "ID", "Kind", "Captured", "Content"
    )
    .unwrap();
    writeln!(
        output,
        "──────  ─────  ────────────────────────  ──────────────────────────────  ──────────────────"
    )
    .unwrap();

    // Rows
    for entry in entries {
        let content = if entry.content.is_empty() {
            &entry.raw_content
        } else {
            &entry.content
        };
        // Truncate by characters, not bytes, to avoid panics on multi-byte UTF-8
        let content_display = if content.chars().count() > 30 {
            format!("{}...", content.chars().take(27).collect::<String>())
        } else {
            content.to_string()
        };
        let labels = entry
            .tags
            .iter()
            .map(display_tag)
            .chain(entry.projects.iter().map(display_project))
            .collect::<Vec<_>>()
            .join(" ");

        writeln!(
            output,
            "{:<6}  {:<5}  {:<24}  {:<30}  {}",
            entry.id_short, entry.kind, entry.created_at, content_display, labels
        )
        .unwrap();
    }

    // Tip
    writeln!(output).unwrap();
    writeln!(
        output,
        "Tip: Use 'jot analyze \"<text>\"' to preview a capture without saving it."
    )
    .unwrap();

    output
}

// ========== JSON Output ==========

/// Format items as JSON.
pub fn format_items_json(entries: &[ItemEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

// ========== Public Interface ==========

/// Runs the list command.
pub fn run<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let entries = get_items_for_display(db)?;

    if json {
        writeln!(writer, "{}", format_items_json(&entries)?)?;
    } else {
        write!(writer, "{}", format_items(&entries))?;
    }
    Ok(())
}
