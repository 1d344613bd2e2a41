//! Text normalization applied before chunking.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::{ChunkingConfig, SplitStrategy};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);").expect("valid regex")
});

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static PARAGRAPH_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid regex"));

/// Punctuation kept by [`clean_text_strict`].
const STRICT_PUNCTUATION: &str = ".,!?;:'\"()-";

/// Strip tag-like `<...>` sequences and replace entities with a space.
///
/// Regex-level, best effort: unterminated tags are left untouched.
pub fn remove_html(text: &str) -> String {
    let without_tags = TAG_RE.replace_all(text, "");
    ENTITY_RE.replace_all(&without_tags, " ").into_owned()
}

/// Collapse every whitespace run (newlines included) into one space and trim.
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// [`clean_text`] after dropping everything except letters, digits,
/// whitespace and basic punctuation.
pub fn clean_text_strict(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || STRICT_PUNCTUATION.contains(*c))
        .collect();
    clean_text(&kept)
}

/// Apply `clean` to each blank-line separated paragraph and rejoin them
/// with a single blank line.
pub fn clean_paragraphs(text: &str, clean: fn(&str) -> String) -> String {
    PARAGRAPH_BREAK_RE
        .split(text)
        .map(clean)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Apply the cleaning steps enabled in `config`.
///
/// Under the paragraphs strategy each paragraph is cleaned on its own so the
/// blank lines between them survive for the splitter.
pub fn normalize(text: &str, config: &ChunkingConfig) -> String {
    let text = if config.remove_html {
        remove_html(text)
    } else {
        text.to_string()
    };

    let clean: fn(&str) -> String = if config.strict_clean {
        clean_text_strict
    } else if config.clean_text {
        clean_text
    } else {
        return text;
    };

    if config.split_strategy == Some(SplitStrategy::Paragraphs) {
        clean_paragraphs(&text, clean)
    } else {
        clean(&text)
    }
}
