//! Locating LLM-quoted text inside the essay HTML.
//!
//! A match is attempted in two passes, first success wins:
//!
//! 1. exact, case-sensitive substring of the raw HTML;
//! 2. if the document's text content contains the quote, a case-insensitive
//!    literal regex against the raw HTML (also tried with the quote
//!    HTML-escaped, so `&` in prose finds `&amp;` in markup).
//!
//! Only the first occurrence counts, and an occurrence is only accepted if
//! it sits entirely inside one text run and neither end cuts through an
//! entity reference. A quote never matches inside a tag or attribute, never
//! spans markup and never splits `&amp;`, so splicing a replacement into
//! the range cannot break the document.

use std::ops::Range;

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::advisory::EditSuggestion;
use crate::html::{entity_containing, escape_html, text_content, text_runs};

lazy_static! {
    static ref BOLD: Regex = Regex::new(r"\*\*(.*?)\*\*").expect("static bold pattern");
    static ref ITALIC: Regex = Regex::new(r"\*(.*?)\*").expect("static italic pattern");
    static ref UNDERLINE: Regex = Regex::new(r"__(.*?)__").expect("static underline pattern");
    static ref NEWLINE: Regex = Regex::new(r"\r?\n").expect("static newline pattern");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Literal substring of the raw HTML.
    Exact,
    /// Found through the document's text content.
    TextContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionMatch {
    /// Byte range in the document HTML.
    pub range: Range<usize>,
    pub kind: MatchKind,
}

impl SuggestionMatch {
    pub fn overlaps(&self, other: &SuggestionMatch) -> bool {
        self.range.start < other.range.end && other.range.start < self.range.end
    }
}

/// Find the first usable occurrence of `suggestion.original_text`.
pub fn locate(document: &str, suggestion: &EditSuggestion) -> Option<SuggestionMatch> {
    let needle = suggestion.original_text.as_str();
    if needle.trim().is_empty() {
        return None;
    }

    let runs = match text_runs(document) {
        Ok(runs) => runs,
        Err(e) => {
            tracing::warn!("document does not tokenize, cannot match suggestions: {e}");
            return None;
        }
    };
    let in_one_run = |range: &Range<usize>| {
        runs.iter()
            .any(|run| run.start <= range.start && range.end <= run.end)
            && entity_containing(document, range.start).is_none()
            && entity_containing(document, range.end).is_none()
    };

    let exact = document
        .match_indices(needle)
        .map(|(start, matched)| start..start + matched.len())
        .find(|range| in_one_run(range));
    if let Some(range) = exact {
        return Some(SuggestionMatch {
            range,
            kind: MatchKind::Exact,
        });
    }

    if !text_content(document).contains(needle) {
        return None;
    }

    let escaped = escape_html(needle);
    let literals = if escaped == needle {
        vec![needle]
    } else {
        vec![needle, escaped.as_str()]
    };
    for literal in literals {
        let pattern = match RegexBuilder::new(&regex::escape(literal))
            .case_insensitive(true)
            .build()
        {
            Ok(pattern) => pattern,
            Err(e) => {
                tracing::warn!("could not build match pattern: {e}");
                return None;
            }
        };
        let found = pattern
            .find_iter(document)
            .map(|m| m.range())
            .find(|range| in_one_run(range));
        if let Some(range) = found {
            return Some(SuggestionMatch {
                range,
                kind: MatchKind::TextContent,
            });
        }
    }

    None
}

/// Whether the suggestion can be located in `document` at all.
pub fn is_applicable(document: &str, suggestion: &EditSuggestion) -> bool {
    locate(document, suggestion).is_some()
}

/// Substitute the first occurrence of the suggestion's original text with
/// its replacement. `None` when the original text cannot be found.
pub fn apply(document: &str, suggestion: &EditSuggestion) -> Option<String> {
    let found = locate(document, suggestion)?;
    let mut out = String::with_capacity(document.len() + suggestion.suggested_text.len());
    out.push_str(&document[..found.range.start]);
    out.push_str(&replacement_html(&suggestion.suggested_text));
    out.push_str(&document[found.range.end..]);
    Some(out)
}

/// Render model output (plain text with light markdown emphasis) as
/// document HTML: escape, then `**bold**`, `__underline__`, `*italic*`
/// and newlines become `<strong>`, `<u>`, `<em>` and `<br>`.
pub fn replacement_html(text: &str) -> String {
    let escaped = escape_html(text);
    let bold = BOLD.replace_all(&escaped, "<strong>$1</strong>");
    let italic = ITALIC.replace_all(&bold, "<em>$1</em>");
    let underline = UNDERLINE.replace_all(&italic, "<u>$1</u>");
    NEWLINE.replace_all(&underline, "<br>").into_owned()
}
