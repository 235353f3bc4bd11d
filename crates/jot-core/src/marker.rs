//! Marker classification: deciding what a token *is*.

use crate::token::Token;
use crate::types::{ProjectName, TagName};

/// What a single token means to the capture parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerKind {
    /// A `#name` tag marker.
    Tag(TagName),
    /// A `+name` or `+"multi word"` project marker.
    Project(ProjectName),
    /// Ordinary content.
    Plain,
}

impl MarkerKind {
    /// Whether this token is metadata rather than content.
    #[must_use]
    pub const fn is_marker(&self) -> bool {
        !matches!(self, Self::Plain)
    }
}

/// Classifies a token by its leading sigil.
///
/// `#` tokens become tags only when the remainder is a valid [`TagName`];
/// `+` tokens become projects when the remainder is non-empty after
/// stripping one matching pair of surrounding quotes. Anything that fails
/// those checks (a lone `#`, `#two words` split by the tokenizer, `+""`)
/// degrades to [`MarkerKind::Plain`] rather than erroring.
pub fn classify_token(token: &Token) -> MarkerKind {
    let text = token.text.as_str();
    if let Some(rest) = text.strip_prefix('#') {
        return TagName::new(rest).map_or(MarkerKind::Plain, MarkerKind::Tag);
    }
    if let Some(rest) = text.strip_prefix('+') {
        return ProjectName::new(strip_matching_quotes(rest))
            .map_or(MarkerKind::Plain, MarkerKind::Project);
    }
    MarkerKind::Plain
}

/// Removes a single pair of surrounding quotes, if both are present.
fn strip_matching_quotes(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

/// Canonical redisplay form of a tag: `#name`.
#[must_use]
pub fn display_tag(name: impl AsRef<str>) -> String {
    format!("#{}", name.as_ref())
}

/// Canonical redisplay form of a project: `+name`, re-quoted when the name
/// contains whitespace so the label parses back to the same name.
#[must_use]
pub fn display_project(name: impl AsRef<str>) -> String {
    let name = name.as_ref();
    if name.contains(char::is_whitespace) {
        format!("+\"{name}\"")
    } else {
        format!("+{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str) -> Token {
        Token {
            text: text.to_string(),
            quoted: text.contains('"'),
        }
    }

    #[test]
    fn classifies_valid_tags() {
        assert_eq!(
            classify_token(&token("#work")),
            MarkerKind::Tag(TagName::new("work").unwrap())
        );
        assert_eq!(
            classify_token(&token("#deep-work_2")),
            MarkerKind::Tag(TagName::new("deep-work_2").unwrap())
        );
    }

    #[test]
    fn invalid_tags_degrade_to_plain() {
        assert_eq!(classify_token(&token("#")), MarkerKind::Plain);
        assert_eq!(classify_token(&token("#with space")), MarkerKind::Plain);
        assert_eq!(classify_token(&token("#emoji🎉")), MarkerKind::Plain);
        assert_eq!(classify_token(&token("work")), MarkerKind::Plain);
    }

    #[test]
    fn classifies_projects_and_strips_quotes() {
        assert_eq!(
            classify_token(&token("+Health")),
            MarkerKind::Project(ProjectName::new("Health").unwrap())
        );
        assert_eq!(
            classify_token(&token("+\"Project Two\"")),
            MarkerKind::Project(ProjectName::new("Project Two").unwrap())
        );
    }

    #[test]
    fn empty_projects_degrade_to_plain() {
        assert_eq!(classify_token(&token("+")), MarkerKind::Plain);
        assert_eq!(classify_token(&token("+\"\"")), MarkerKind::Plain);
    }

    #[test]
    fn unmatched_quote_is_kept_in_the_name() {
        assert_eq!(
            classify_token(&token("+\"half")),
            MarkerKind::Project(ProjectName::new("\"half").unwrap())
        );
    }

    #[test]
    fn redisplay_requotes_only_names_with_whitespace() {
        let one = ProjectName::new("Health").unwrap();
        let two = ProjectName::new("Project Two").unwrap();
        assert_eq!(display_project(&one), "+Health");
        assert_eq!(display_project(&two), "+\"Project Two\"");
        assert_eq!(display_tag(&TagName::new("work").unwrap()), "#work");
    }
}
