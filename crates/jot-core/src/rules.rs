//! Classification rules: the condition model and its evaluation.
//!
//! Rules are declarative data (loadable from configuration) compiled into a
//! [`RuleSet`] snapshot that evaluates in descending priority order. The
//! first rule whose every condition holds wins.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::bookmark::{contains_url, is_bare_url};
use crate::types::{ItemKind, ProjectName, TagName};

/// What a matched rule recommends doing with the capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAction {
    /// The kind of item to suggest.
    pub kind: ItemKind,
    /// Machine-readable reason code surfaced to the user.
    pub reason: String,
}

/// A single condition inside a rule. All conditions of a rule must hold.
///
/// Conditions are total: one that cannot evaluate (an invalid regex, an
/// empty keyword list, a length check with no bounds) never matches rather
/// than erroring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleCondition {
    /// At least one of the listed keywords appears in the cleaned text,
    /// case-insensitively.
    Keyword {
        /// Keywords, any of which satisfies the condition.
        any: Vec<String>,
    },
    /// The cleaned text matches the pattern.
    Regex {
        /// A regex in the syntax of the `regex` crate.
        pattern: String,
    },
    /// The raw input, trimmed, is nothing but an absolute URL.
    BareUrl,
    /// The cleaned text contains an absolute URL anywhere.
    ContainsUrl,
    /// The cleaned text length, in characters, falls within the bounds.
    Length {
        /// Inclusive lower bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at_least: Option<usize>,
        /// Inclusive upper bound.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at_most: Option<usize>,
    },
    /// At least this many tags were extracted (the implicit `bookmark` tag
    /// counts).
    MinTags {
        /// Minimum number of extracted tags.
        count: usize,
    },
}

/// A classification rule as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRule {
    /// Stable identifier, used in diagnostics.
    pub id: String,
    /// Human-readable name for the admin surface.
    pub name: String,
    /// Higher priorities evaluate first; ties keep configured order.
    pub priority: i64,
    /// Conditions combined with AND semantics. A rule with no conditions
    /// matches everything.
    #[serde(default)]
    pub conditions: Vec<RuleCondition>,
    /// What to suggest when the rule matches.
    pub action: RuleAction,
}

/// The text and context a rule set evaluates against.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    /// Content with metadata clusters removed.
    pub cleaned: &'a str,
    /// The input exactly as typed.
    pub raw: &'a str,
    /// Extracted tags, implicit `bookmark` included.
    pub tags: &'a [TagName],
    /// Extracted projects.
    pub projects: &'a [ProjectName],
}

/// A suggested item kind with reasoning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// The suggested kind.
    pub kind: ItemKind,
    /// Reason code explaining why this kind was suggested.
    pub reason: String,
}

/// The outcome of evaluating a rule set: which rule fired and what it said.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    /// Identifier of the winning rule.
    pub rule_id: String,
    /// The winning rule's action.
    pub suggestion: Suggestion,
}

/// A condition with its expensive parts (regexes, lowercasing) done once.
#[derive(Debug, Clone)]
enum CompiledCondition {
    Keyword { any: Vec<String> },
    Regex(Option<Regex>),
    BareUrl,
    ContainsUrl,
    Length { at_least: Option<usize>, at_most: Option<usize> },
    MinTags { count: usize },
}

impl CompiledCondition {
    fn compile(condition: &RuleCondition, rule_id: &str) -> Self {
        match condition {
            RuleCondition::Keyword { any } => Self::Keyword {
                any: any
                    .iter()
                    .filter(|keyword| !keyword.is_empty())
                    .map(|keyword| keyword.to_lowercase())
                    .collect(),
            },
            RuleCondition::Regex { pattern } => match Regex::new(pattern) {
                Ok(regex) => Self::Regex(Some(regex)),
                Err(err) => {
                    tracing::warn!(
                        rule = rule_id,
                        pattern,
                        error = %err,
                        "invalid rule regex, condition will never match"
                    );
                    Self::Regex(None)
                }
            },
            RuleCondition::BareUrl => Self::BareUrl,
            RuleCondition::ContainsUrl => Self::ContainsUrl,
            RuleCondition::Length { at_least, at_most } => Self::Length {
                at_least: *at_least,
                at_most: *at_most,
            },
            RuleCondition::MinTags { count } => Self::MinTags { count: *count },
        }
    }

    fn matches(&self, input: &RuleInput<'_>) -> bool {
        match self {
            Self::Keyword { any } => {
                if any.is_empty() {
                    return false;
                }
                let lowered = input.cleaned.to_lowercase();
                any.iter().any(|keyword| lowered.contains(keyword))
            }
            Self::Regex(compiled) => compiled
                .as_ref()
                .is_some_and(|regex| regex.is_match(input.cleaned)),
            Self::BareUrl => is_bare_url(input.raw),
            Self::ContainsUrl => contains_url(input.cleaned),
            Self::Length { at_least, at_most } => {
                if at_least.is_none() && at_most.is_none() {
                    return false;
                }
                let length = input.cleaned.chars().count();
                at_least.is_none_or(|min| length >= min)
                    && at_most.is_none_or(|max| length <= max)
            }
            Self::MinTags { count } => input.tags.len() >= *count,
        }
    }
}

/// A rule with its conditions compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: ClassificationRule,
    conditions: Vec<CompiledCondition>,
}

impl CompiledRule {
    fn compile(rule: ClassificationRule) -> Self {
        let conditions = rule
            .conditions
            .iter()
            .map(|condition| CompiledCondition::compile(condition, &rule.id))
            .collect();
        Self { rule, conditions }
    }

    /// The rule as configured.
    pub const fn rule(&self) -> &ClassificationRule {
        &self.rule
    }

    fn matches(&self, input: &RuleInput<'_>) -> bool {
        self.conditions.iter().all(|c| c.matches(input))
    }
}

/// An immutable, evaluation-ordered snapshot of the configured rules.
///
/// Snapshots carry a generation number so callers can tell rule sets apart
/// across hot reloads; a single evaluation only ever sees one snapshot.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
    generation: u64,
}

impl RuleSet {
    /// Compiles rules into evaluation order: descending priority, with the
    /// configured order kept for equal priorities.
    #[must_use]
    pub fn compile(mut rules: Vec<ClassificationRule>, generation: u64) -> Self {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        let rules = rules.into_iter().map(CompiledRule::compile).collect();
        Self { rules, generation }
    }

    /// The snapshot's generation number.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// The rules in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = &ClassificationRule> {
        self.rules.iter().map(CompiledRule::rule)
    }

    /// Number of rules in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the snapshot has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the first matching rule's action, or `None` when nothing
    /// matches and the capture should stay an untyped inbox item.
    pub fn evaluate(&self, input: &RuleInput<'_>) -> Option<RuleMatch> {
        self.rules
            .iter()
            .find(|rule| rule.matches(input))
            .map(|winner| RuleMatch {
                rule_id: winner.rule.id.clone(),
                suggestion: Suggestion {
                    kind: winner.rule.action.kind,
                    reason: winner.rule.action.reason.clone(),
                },
            })
    }
}

/// The built-in rule set used when no rule file is configured.
#[must_use]
pub fn default_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule {
            id: "bare-url-note".to_string(),
            name: "Bare links become notes".to_string(),
            priority: 100,
            conditions: vec![RuleCondition::BareUrl],
            action: RuleAction {
                kind: ItemKind::Note,
                reason: "url_detected".to_string(),
            },
        },
        ClassificationRule {
            id: "link-note".to_string(),
            name: "Links become notes".to_string(),
            priority: 90,
            conditions: vec![RuleCondition::ContainsUrl],
            action: RuleAction {
                kind: ItemKind::Note,
                reason: "url_detected".to_string(),
            },
        },
        ClassificationRule {
            id: "action-task".to_string(),
            name: "Action words become tasks".to_string(),
            priority: 50,
            conditions: vec![RuleCondition::Keyword {
                any: ["call", "buy", "fix", "email", "schedule", "pay", "send", "book"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            }],
            action: RuleAction {
                kind: ItemKind::Task,
                reason: "keyword_match".to_string(),
            },
        },
        ClassificationRule {
            id: "question-note".to_string(),
            name: "Questions become notes".to_string(),
            priority: 40,
            conditions: vec![RuleCondition::Regex {
                pattern: r"\?\s*$".to_string(),
            }],
            action: RuleAction {
                kind: ItemKind::Note,
                reason: "question".to_string(),
            },
        },
        ClassificationRule {
            id: "heavy-tag-note".to_string(),
            name: "Tag-heavy captures become notes".to_string(),
            priority: 20,
            conditions: vec![RuleCondition::MinTags { count: 3 }],
            action: RuleAction {
                kind: ItemKind::Note,
                reason: "tag_heavy".to_string(),
            },
        },
        ClassificationRule {
            id: "short-task".to_string(),
            name: "Short captures default to tasks".to_string(),
            priority: 10,
            // Floor of one: marker-only captures clean to an empty string
            // and stay in the inbox.
            conditions: vec![RuleCondition::Length {
                at_least: Some(1),
                at_most: Some(60),
            }],
            action: RuleAction {
                kind: ItemKind::Task,
                reason: "short_capture".to_string(),
            },
        },
    ]
}
