//! Bare-URL detection and the implicit `bookmark` tag.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::TagName;

/// Tag injected when a capture is nothing but a URL.
pub const BOOKMARK_TAG: &str = "bookmark";

// Whole-input form: scheme, a host, then optional path/query/fragment.
static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://[A-Za-z0-9][A-Za-z0-9.-]*(?::\d+)?(?:[/?#]\S*)?$").unwrap()
});

static CONTAINS_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://\S+").unwrap());

/// Whether the trimmed input is nothing but an absolute `http(s)` URL.
///
/// A URL inside a longer sentence does not count; the bookmark shorthand
/// exists for pasting a link and nothing else into the capture box.
#[must_use]
pub fn is_bare_url(text: &str) -> bool {
    BARE_URL.is_match(text.trim())
}

/// Whether the text contains an absolute `http(s)` URL anywhere.
#[must_use]
pub fn contains_url(text: &str) -> bool {
    CONTAINS_URL.is_match(text)
}

/// Appends the implicit `bookmark` tag when the raw capture is a bare URL
/// and the tag is not already present case-insensitively.
pub fn augment_bookmark(raw_content: &str, tags: &mut Vec<TagName>) {
    if !is_bare_url(raw_content) {
        return;
    }
    if tags
        .iter()
        .any(|tag| tag.as_str().eq_ignore_ascii_case(BOOKMARK_TAG))
    {
        return;
    }
    if let Ok(tag) = TagName::new(BOOKMARK_TAG) {
        tags.push(tag);
    }
}
