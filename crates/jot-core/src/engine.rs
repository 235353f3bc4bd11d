//! The live classification engine: parse, augment, evaluate.
//!
//! The engine owns the one piece of shared mutable state in this crate, the
//! installed [`RuleSet`]. Rule sets are replaced wholesale behind an
//! [`RwLock`]; evaluation clones the [`Arc`] once and works on that
//! snapshot, so a hot reload can never hand a single call half of each
//! generation.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::bookmark::augment_bookmark;
use crate::parse::parse;
use crate::rules::{ClassificationRule, RuleInput, RuleSet, Suggestion};
use crate::types::{ItemKind, ProjectName, TagName};

/// What the analyze endpoint returns for one line of capture text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Extracted tags, including an implicit `bookmark` for bare URLs.
    pub tags: Vec<TagName>,
    /// Extracted projects.
    pub projects: Vec<ProjectName>,
    /// Content with metadata clusters removed.
    pub cleaned_content: String,
    /// Suggested item kind, if any rule matched.
    pub suggested_kind: Option<ItemKind>,
    /// Reason code of the matching rule.
    pub suggested_reason: Option<String>,
}

/// An analysis plus diagnostics for the rule admin surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailedAnalysis {
    /// The analysis as the capture UI would see it.
    pub analysis: AnalysisResult,
    /// Identifier of the rule that fired, if any.
    pub matched_rule: Option<String>,
    /// Generation of the rule-set snapshot the analysis ran against.
    pub generation: u64,
}

/// The capture pipeline with its hot-reloadable rule set.
#[derive(Debug)]
pub struct Engine {
    rules: RwLock<Arc<RuleSet>>,
}

impl Engine {
    /// Creates an engine with generation 1 of the given rules.
    #[must_use]
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        Self {
            rules: RwLock::new(Arc::new(RuleSet::compile(rules, 1))),
        }
    }

    /// The current rule-set snapshot.
    ///
    /// Holders keep a consistent view across reloads; the engine never
    /// mutates a snapshot in place.
    #[must_use]
    pub fn snapshot(&self) -> Arc<RuleSet> {
        Arc::clone(&self.rules.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces the rule set wholesale, bumping the generation.
    ///
    /// In-flight evaluations keep the snapshot they started with.
    pub fn install(&self, rules: Vec<ClassificationRule>) -> Arc<RuleSet> {
        let mut guard = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(RuleSet::compile(rules, guard.generation() + 1));
        *guard = Arc::clone(&next);
        tracing::debug!(
            generation = next.generation(),
            rules = next.len(),
            "installed rule set"
        );
        next
    }

    /// First-match classification of already-parsed input.
    pub fn classify(&self, input: &RuleInput<'_>) -> Option<Suggestion> {
        self.snapshot()
            .evaluate(input)
            .map(|matched| matched.suggestion)
    }

    /// Runs the full pipeline on one line of capture text.
    ///
    /// Side-effect-free: parsing, bookmark augmentation, and rule
    /// evaluation, with no entity creation.
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        self.analyze_detailed(text).analysis
    }

    /// [`Engine::analyze`], plus which rule fired and against which
    /// rule-set generation.
    pub fn analyze_detailed(&self, text: &str) -> DetailedAnalysis {
        let parsed = parse(text);
        let mut tags = parsed.tags;
        augment_bookmark(&parsed.raw_content, &mut tags);

        let snapshot = self.snapshot();
        let matched = snapshot.evaluate(&RuleInput {
            cleaned: &parsed.cleaned_content,
            raw: &parsed.raw_content,
            tags: &tags,
            projects: &parsed.projects,
        });

        let (matched_rule, suggestion) = match matched {
            Some(m) => (Some(m.rule_id), Some(m.suggestion)),
            None => (None, None),
        };

        DetailedAnalysis {
            analysis: AnalysisResult {
                tags,
                projects: parsed.projects,
                cleaned_content: parsed.cleaned_content,
                suggested_kind: suggestion.as_ref().map(|s| s.kind),
                suggested_reason: suggestion.map(|s| s.reason),
            },
            matched_rule,
            generation: snapshot.generation(),
        }
    }
}

impl Default for Engine {
    /// An engine loaded with the built-in rules.
    fn default() -> Self {
        Self::new(crate::rules::default_rules())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    use super::*;
    use crate::rules::{RuleAction, RuleCondition, default_rules};

    fn rule(id: &str, priority: i64, conditions: Vec<RuleCondition>, kind: ItemKind, reason: &str) -> ClassificationRule {
        ClassificationRule {
            id: id.to_string(),
            name: id.to_string(),
            priority,
            conditions,
            action: RuleAction {
                kind,
                reason: reason.to_string(),
            },
        }
    }

    #[test]
    fn analyze_extracts_and_suggests() {
        let engine = Engine::default();
        let result = engine.analyze("#work +Health walk the dog");

        assert_eq!(result.tags.len(), 1);
        assert_eq!(result.tags[0].as_str(), "work");
        assert_eq!(result.projects[0].as_str(), "Health");
        assert_eq!(result.cleaned_content, "walk the dog");
        // Short capture with no URL or keyword falls through to the
        // length-based default.
        assert_eq!(result.suggested_kind, Some(ItemKind::Task));
        assert_eq!(result.suggested_reason.as_deref(), Some("short_capture"));
    }

    #[test]
    fn bare_url_gets_bookmark_tag_and_note_suggestion() {
        let engine = Engine::default();
        let detail = engine.analyze_detailed("https://example.com");

        assert_eq!(detail.analysis.tags.len(), 1);
        assert_eq!(detail.analysis.tags[0].as_str(), "bookmark");
        assert_eq!(detail.analysis.suggested_kind, Some(ItemKind::Note));
        assert_eq!(
            detail.analysis.suggested_reason.as_deref(),
            Some("url_detected")
        );
        assert_eq!(detail.matched_rule.as_deref(), Some("bare-url-note"));
    }

    #[test]
    fn higher_priority_rule_wins() {
        let engine = Engine::new(vec![
            rule(
                "keyword-call",
                5,
                vec![RuleCondition::Keyword {
                    any: vec!["call".to_string()],
                }],
                ItemKind::Task,
                "keyword_match",
            ),
            rule(
                "contains-url",
                10,
                vec![RuleCondition::ContainsUrl],
                ItemKind::Note,
                "url_detected",
            ),
        ]);

        let result = engine.analyze("call https://x.com");
        assert_eq!(result.suggested_kind, Some(ItemKind::Note));
        assert_eq!(result.suggested_reason.as_deref(), Some("url_detected"));
    }

    #[test]
    fn no_match_leaves_capture_untyped() {
        let engine = Engine::new(vec![rule(
            "keyword-call",
            5,
            vec![RuleCondition::Keyword {
                any: vec!["call".to_string()],
            }],
            ItemKind::Task,
            "keyword_match",
        )]);

        let detail = engine.analyze_detailed("walk the dog");
        assert_eq!(detail.analysis.suggested_kind, None);
        assert_eq!(detail.analysis.suggested_reason, None);
        assert_eq!(detail.matched_rule, None);
    }

    #[test]
    fn marker_only_captures_get_no_suggestion() {
        let engine = Engine::default();

        // These clean to an empty string; the built-in length rule starts
        // at one character, so nothing fires and the capture stays inbox.
        for text in ["#a", "+errands", "#work +home"] {
            let result = engine.analyze(text);
            assert_eq!(result.cleaned_content, "", "{text}");
            assert_eq!(result.suggested_kind, None, "{text}");
            assert_eq!(result.suggested_reason, None, "{text}");
        }
    }

    #[test]
    fn min_tags_sees_the_implicit_bookmark_tag() {
        let engine = Engine::new(vec![rule(
            "any-tag",
            10,
            vec![RuleCondition::MinTags { count: 1 }],
            ItemKind::Note,
            "tagged",
        )]);

        let result = engine.analyze("https://example.com");
        assert_eq!(result.suggested_kind, Some(ItemKind::Note));
    }

    #[test]
    fn install_bumps_generation_and_applies_new_rules() {
        let engine = Engine::new(default_rules());
        assert_eq!(engine.snapshot().generation(), 1);

        let installed = engine.install(vec![rule(
            "everything-note",
            1,
            vec![],
            ItemKind::Note,
            "fallback",
        )]);
        assert_eq!(installed.generation(), 2);

        let detail = engine.analyze_detailed("buy milk");
        assert_eq!(detail.generation, 2);
        assert_eq!(detail.analysis.suggested_reason.as_deref(), Some("fallback"));
    }

    #[test]
    fn snapshots_keep_their_view_across_reloads() {
        let engine = Engine::new(default_rules());
        let before = engine.snapshot();
        engine.install(vec![]);

        assert_eq!(before.generation(), 1);
        assert_eq!(before.len(), default_rules().len());
        assert!(engine.snapshot().is_empty());
    }

    #[test]
    fn reload_is_atomic_for_concurrent_observers() {
        fn marked(kind: ItemKind, reason: &str) -> Vec<ClassificationRule> {
            vec![
                rule("a", 10, vec![], kind, reason),
                rule("b", 5, vec![], kind, reason),
            ]
        }

        // Odd generations suggest note/"odd", even ones task/"even"; an
        // observer seeing any other pairing has seen a torn rule set.
        let engine = Arc::new(Engine::new(marked(ItemKind::Note, "odd")));
        let stop = Arc::new(AtomicBool::new(false));

        let observer = {
            let engine = Arc::clone(&engine);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    let detail = engine.analyze_detailed("anything at all");
                    let (kind, reason) = if detail.generation % 2 == 1 {
                        (ItemKind::Note, "odd")
                    } else {
                        (ItemKind::Task, "even")
                    };
                    assert_eq!(detail.analysis.suggested_kind, Some(kind));
                    assert_eq!(detail.analysis.suggested_reason.as_deref(), Some(reason));
                }
            })
        };

        for i in 0..200 {
            if i % 2 == 0 {
                engine.install(marked(ItemKind::Task, "even"));
            } else {
                engine.install(marked(ItemKind::Note, "odd"));
            }
        }
        stop.store(true, Ordering::Relaxed);
        observer.join().unwrap();
    }
}
