//! Extraction and content cleaning for a single line of capture text.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::cluster::find_valid_clusters;
use crate::marker::{MarkerKind, classify_token};
use crate::token::tokenize;
use crate::types::{ProjectName, TagName};

/// Everything one line of capture text parses into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Tag names drawn from valid clusters, in first-seen order,
    /// case-insensitively deduplicated with the first casing kept.
    pub tags: Vec<TagName>,
    /// Project names drawn from valid clusters, same ordering rules.
    pub projects: Vec<ProjectName>,
    /// The input with valid-cluster tokens removed, rejoined with single
    /// spaces.
    pub cleaned_content: String,
    /// The input exactly as given.
    pub raw_content: String,
}

/// Parses one line of capture text.
///
/// Markers contribute metadata only from valid clusters; a marker stranded
/// mid-sentence stays in the cleaned content as an ordinary word. Cleaning
/// is idempotent: parsing `cleaned_content` again extracts nothing further.
pub fn parse(text: &str) -> ParseResult {
    let tokens = tokenize(text);
    let kinds: Vec<MarkerKind> = tokens.iter().map(classify_token).collect();
    let clusters = find_valid_clusters(&kinds);

    let mut tags: Vec<TagName> = Vec::new();
    let mut projects: Vec<ProjectName> = Vec::new();
    let mut seen_tags: HashSet<String> = HashSet::new();
    let mut seen_projects: HashSet<String> = HashSet::new();
    let mut kept: Vec<&str> = Vec::new();

    for (index, kind) in kinds.iter().enumerate() {
        if !clusters.iter().any(|c| c.contains(index)) {
            kept.push(tokens[index].text.as_str());
            continue;
        }
        match kind {
            MarkerKind::Tag(name) => {
                if seen_tags.insert(name.as_str().to_lowercase()) {
                    tags.push(name.clone());
                }
            }
            MarkerKind::Project(name) => {
                if seen_projects.insert(name.as_str().to_lowercase()) {
                    projects.push(name.clone());
                }
            }
            MarkerKind::Plain => {}
        }
    }

    ParseResult {
        tags,
        projects,
        cleaned_content: kept.join(" "),
        raw_content: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_strs(result: &ParseResult) -> Vec<&str> {
        result.tags.iter().map(TagName::as_str).collect()
    }

    fn project_strs(result: &ParseResult) -> Vec<&str> {
        result.projects.iter().map(ProjectName::as_str).collect()
    }

    #[test]
    fn leading_cluster_is_extracted() {
        let result = parse("#work +Health walk the dog");
        assert_eq!(tag_strs(&result), vec!["work"]);
        assert_eq!(project_strs(&result), vec!["Health"]);
        assert_eq!(result.cleaned_content, "walk the dog");
        assert_eq!(result.raw_content, "#work +Health walk the dog");
    }

    #[test]
    fn trailing_cluster_is_extracted() {
        let result = parse("walk the dog #work +Health");
        assert_eq!(tag_strs(&result), vec!["work"]);
        assert_eq!(project_strs(&result), vec!["Health"]);
        assert_eq!(result.cleaned_content, "walk the dog");
    }

    #[test]
    fn stranded_marker_stays_in_content() {
        let result = parse("walk #work the dog");
        assert!(result.tags.is_empty());
        assert!(result.projects.is_empty());
        assert_eq!(result.cleaned_content, "walk #work the dog");
    }

    #[test]
    fn quoted_project_name_is_stored_unquoted() {
        let result = parse("+\"Project Two\" call client");
        assert_eq!(project_strs(&result), vec!["Project Two"]);
        assert_eq!(result.cleaned_content, "call client");
    }

    #[test]
    fn dedupe_is_case_insensitive_keeping_first_casing() {
        let result = parse("#Work #work");
        assert_eq!(tag_strs(&result), vec!["Work"]);
        assert_eq!(result.cleaned_content, "");

        let result = parse("+Health +HEALTH buy vitamins");
        assert_eq!(project_strs(&result), vec!["Health"]);
    }

    #[test]
    fn clusters_at_both_edges_contribute() {
        let result = parse("#morning walk the dog #evening +Health");
        assert_eq!(tag_strs(&result), vec!["morning", "evening"]);
        assert_eq!(project_strs(&result), vec!["Health"]);
        assert_eq!(result.cleaned_content, "walk the dog");
    }

    #[test]
    fn all_marker_input_cleans_to_empty() {
        let result = parse("#a +proj #b");
        assert_eq!(tag_strs(&result), vec!["a", "b"]);
        assert_eq!(project_strs(&result), vec!["proj"]);
        assert_eq!(result.cleaned_content, "");
    }

    #[test]
    fn empty_input_parses_to_empty() {
        let result = parse("");
        assert!(result.tags.is_empty());
        assert!(result.projects.is_empty());
        assert_eq!(result.cleaned_content, "");
        assert_eq!(result.raw_content, "");
    }

    #[test]
    fn whitespace_noise_collapses_in_cleaned_content() {
        let result = parse("  #work   walk   the dog  ");
        assert_eq!(tag_strs(&result), vec!["work"]);
        assert_eq!(result.cleaned_content, "walk the dog");
    }

    #[test]
    fn cleaning_is_idempotent() {
        let inputs = [
            "#work +Health walk the dog",
            "walk the dog #work +Health",
            "walk #work the dog",
            "#a b #c d #e",
            "+\"Project Two\" call client",
            "#a +proj #b",
            "",
        ];
        for input in inputs {
            let first = parse(input);
            let second = parse(&first.cleaned_content);
            assert!(second.tags.is_empty(), "re-parse of {input:?} found tags");
            assert!(
                second.projects.is_empty(),
                "re-parse of {input:?} found projects"
            );
            assert_eq!(
                second.cleaned_content, first.cleaned_content,
                "re-parse of {input:?} changed the content"
            );
        }
    }
}
