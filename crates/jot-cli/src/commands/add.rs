//! Add command: the quick-capture flow.
//!
//! Parses the text, classifies it, provisions any referenced tags and
//! projects, and stores the item. Entities that fail to provision are
//! reported but never abort the capture; the item is stored without the
//! missing links.

use std::io::Write;

use anyhow::{Context, Result};

use jot_core::types::{CaptureKind, ItemKind};
use jot_core::{
    Engine, EntityKind, ExistingEntities, ProjectRepository, ProvisionFailure, TagRepository,
    ensure_entities,
};
use jot_db::{Database, ItemRecord, NewItem, SharedDatabase};

/// A stored capture plus anything that went wrong along the way.
#[derive(Debug)]
pub struct CaptureOutcome {
    pub item: ItemRecord,
    pub failures: Vec<ProvisionFailure>,
}

/// Parses, classifies, provisions, and stores one capture.
///
/// The kind is the override when given, otherwise the rule suggestion,
/// otherwise `inbox`. The rule reason is only stored when the rules actually
/// decided the kind.
pub async fn capture(
    db: Database,
    engine: &Engine,
    text: &str,
    kind_override: Option<ItemKind>,
) -> Result<(Database, CaptureOutcome)> {
    let analysis = engine.analyze(text);
    let kind = kind_override.map_or_else(
        || {
            analysis
                .suggested_kind
                .map_or(CaptureKind::Inbox, CaptureKind::from)
        },
        CaptureKind::from,
    );
    let suggested_reason = if kind_override.is_none() {
        analysis.suggested_reason.clone()
    } else {
        None
    };

    let shared = SharedDatabase::new(db);
    let existing = ExistingEntities {
        tags: TagRepository::list_tags(&shared)
            .await
            .context("failed to list tags")?,
        projects: ProjectRepository::list_projects(&shared)
            .await
            .context("failed to list projects")?,
    };
    let provisioned =
        ensure_entities(&analysis.tags, &analysis.projects, &existing, &shared, &shared).await;

    let mut db = shared.into_inner();
    let item = db
        .insert_item(&NewItem {
            raw_content: text.to_string(),
            content: analysis.cleaned_content,
            kind: kind.as_str().to_string(),
            suggested_reason,
            tag_ids: provisioned
                .tag_refs
                .iter()
                .map(|tag| tag.id.clone())
                .collect(),
            project_ids: provisioned
                .project_refs
                .iter()
                .map(|project| project.id.clone())
                .collect(),
        })
        .context("failed to store item")?;

    Ok((
        db,
        CaptureOutcome {
            item,
            failures: provisioned.failures,
        },
    ))
}

/// Format a capture outcome for human-readable output.
pub fn format_capture(outcome: &CaptureOutcome) -> String {
    use std::fmt::Write as _;

    let mut output = String::new();
    let item = &outcome.item;
    // All-marker captures clean down to nothing; show the raw text then.
    let content = if item.content.is_empty() {
        &item.raw_content
    } else {
        &item.content
    };

    writeln!(output, "Captured {}: {}", item.kind, content).unwrap();
    writeln!(output, "Id:       {}", item.id).unwrap();
    if !item.tags.is_empty() {
        writeln!(output, "Tags:     {}", item.tags.join(", ")).unwrap();
    }
    if !item.projects.is_empty() {
        writeln!(output, "Projects: {}", item.projects.join(", ")).unwrap();
    }
    if let Some(reason) = &item.suggested_reason {
        writeln!(output, "Reason:   {reason}").unwrap();
    }
    for failure in &outcome.failures {
        let kind = match failure.kind {
            EntityKind::Tag => "tag",
            EntityKind::Project => "project",
        };
        writeln!(
            output,
            "Warning:  could not create {kind} \"{}\": {}",
            failure.name, failure.error
        )
        .unwrap();
    }
    output
}

/// Runs the add command.
pub async fn run<W: Write>(
    writer: &mut W,
    db: Database,
    engine: &Engine,
    text: &str,
    kind_override: Option<ItemKind>,
) -> Result<()> {
    let (_db, outcome) = capture(db, engine, text, kind_override).await?;
    write!(writer, "{}", format_capture(&outcome))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn capture_classifies_and_provisions() {
        let db = Database::open_in_memory().unwrap();
        let engine = Engine::default();

        let (db, outcome) = capture(db, &engine, "#work +Health call the dentist", None)
            .await
            .unwrap();

        assert_eq!(outcome.item.kind, "task");
        assert_eq!(outcome.item.content, "call the dentist");
        assert_eq!(outcome.item.raw_content, "#work +Health call the dentist");
        assert_eq!(outcome.item.tags, vec!["work"]);
        assert_eq!(outcome.item.projects, vec!["Health"]);
        assert_eq!(
            outcome.item.suggested_reason.as_deref(),
            Some("keyword_match")
        );
        assert!(outcome.failures.is_empty());

        assert_eq!(db.list_items().unwrap().len(), 1);
        assert_eq!(db.list_tags().unwrap().len(), 1);
        assert_eq!(db.list_projects().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn capture_reuses_existing_entities_across_casings() {
        let mut db = Database::open_in_memory().unwrap();
        db.create_tag("Work").unwrap();
        let engine = Engine::default();

        let (db, outcome) = capture(db, &engine, "#work buy stamps", None).await.unwrap();

        // The stored casing wins over the capture's casing.
        assert_eq!(outcome.item.tags, vec!["Work"]);
        assert_eq!(db.list_tags().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn capture_respects_kind_override() {
        let db = Database::open_in_memory().unwrap();
        let engine = Engine::default();

        let (_db, outcome) = capture(db, &engine, "call mom", Some(ItemKind::Note))
            .await
            .unwrap();

        assert_eq!(outcome.item.kind, "note");
        assert!(outcome.item.suggested_reason.is_none());
    }

    #[tokio::test]
    async fn capture_without_a_matching_rule_goes_to_inbox() {
        let db = Database::open_in_memory().unwrap();
        let engine = Engine::default();
        let text =
            "thinking about the architecture for the new garden shed before winter arrives";

        let (_db, outcome) = capture(db, &engine, text, None).await.unwrap();

        assert_eq!(outcome.item.kind, "inbox");
        assert!(outcome.item.suggested_reason.is_none());
    }

    #[tokio::test]
    async fn capture_of_a_bare_url_becomes_a_bookmark_note() {
        let db = Database::open_in_memory().unwrap();
        let engine = Engine::default();

        let (db, outcome) = capture(db, &engine, "https://example.com/article", None)
            .await
            .unwrap();

        assert_eq!(outcome.item.kind, "note");
        assert_eq!(outcome.item.content, "https://example.com/article");
        assert_eq!(outcome.item.tags, vec!["bookmark"]);
        assert_eq!(outcome.item.suggested_reason.as_deref(), Some("url_detected"));
        assert_eq!(db.list_tags().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn repeated_markers_are_stored_once() {
        let db = Database::open_in_memory().unwrap();
        let engine = Engine::default();

        let (db, outcome) = capture(db, &engine, "#Work #work same tags", None)
            .await
            .unwrap();

        assert_eq!(outcome.item.tags, vec!["Work"]);
        assert_eq!(db.list_tags().unwrap().len(), 1);
    }

    #[test]
    fn format_capture_reports_failures() {
        use jot_core::RepoError;

        let outcome = CaptureOutcome {
            item: ItemRecord {
                id: "item-1".to_string(),
                raw_content: "#work walk".to_string(),
                content: "walk".to_string(),
                kind: "task".to_string(),
                suggested_reason: Some("short_capture".to_string()),
                created_at: "2026-02-11T09:00:00.000Z".to_string(),
                tags: Vec::new(),
                projects: Vec::new(),
            },
            failures: vec![ProvisionFailure {
                kind: EntityKind::Tag,
                name: "work".to_string(),
                error: RepoError::storage("disk full"),
            }],
        };

        let output = format_capture(&outcome);
        assert!(output.contains("Captured task: walk"));
        assert!(output.contains("could not create tag \"work\""));
        assert!(output.contains("disk full"));
    }
}
