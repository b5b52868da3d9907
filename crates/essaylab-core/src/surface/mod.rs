//! The editable essay surface.
//!
//! `RichTextSurface` owns the document HTML the user edits and guarantees
//! that only the allowed tag vocabulary enters it through paste. While an
//! overlay is active the surface is locked: user input, pastes, formatting
//! and external content pushes are inert until the review resolves.

mod format;
mod sanitize;

pub use format::{apply_format, FormatCommand};
pub use sanitize::{sanitize_html, text_to_html};

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::markup::{BLOCK_TAGS, VOID_TAGS};
use crate::html::{self, tokenize, Token, TokenKind};

/// What the clipboard offered on paste. Either flavor may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardPayload {
    pub html: Option<String>,
    pub text: Option<String>,
}

impl ClipboardPayload {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            html: None,
            text: Some(text.into()),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Content propagated upward after the surface changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    pub html: String,
    pub word_count: usize,
    /// The UI should return focus to the editable surface.
    pub refocus: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RichTextSurface {
    content: String,
    word_count: usize,
    locked: bool,
    max_words: Option<usize>,
}

impl RichTextSurface {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let word_count = html::word_count(&content);
        Self {
            content,
            word_count,
            locked: false,
            max_words: None,
        }
    }

    pub fn with_max_words(mut self, max_words: Option<usize>) -> Self {
        self.max_words = max_words;
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn max_words(&self) -> Option<usize> {
        self.max_words
    }

    pub fn over_word_limit(&self) -> bool {
        self.max_words.is_some_and(|max| self.word_count > max)
    }

    /// True while a suggestion overlay is displayed.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Replace the document from outside (e.g. after loading). Ignored while
    /// an overlay is active; returns whether the content was applied.
    pub fn set_content(&mut self, html: impl Into<String>) -> bool {
        if self.locked {
            debug!("set_content ignored: suggestion overlay active");
            return false;
        }
        self.replace(html.into());
        true
    }

    /// Record the HTML the UI reports after typing or another direct
    /// mutation.
    pub fn on_user_edit(&mut self, html: impl Into<String>) -> Option<ContentChange> {
        if self.locked {
            return None;
        }
        self.replace(html.into());
        Some(self.change(false))
    }

    /// Insert clipboard content at `caret` (a byte offset into the current
    /// HTML; `None` appends).
    pub fn on_paste(
        &mut self,
        payload: &ClipboardPayload,
        caret: Option<usize>,
    ) -> Option<ContentChange> {
        if self.locked {
            debug!("paste ignored: suggestion overlay active");
            return None;
        }

        let fragment = paste_fragment(payload)?;
        let at = self.snap_caret(caret.unwrap_or(self.content.len()));
        let content = insert_fragment(&self.content, at, &fragment);
        self.replace(content);
        Some(self.change(true))
    }

    /// Apply a toolbar formatting command to `selection`.
    pub fn apply_format(
        &mut self,
        command: FormatCommand,
        selection: Range<usize>,
    ) -> Option<ContentChange> {
        if self.locked {
            return None;
        }
        match apply_format(&self.content, command, selection) {
            Some(updated) => self.replace(updated),
            None => debug!("format {command:?} made no change"),
        }
        Some(self.change(true))
    }

    pub(crate) fn lock(&mut self) {
        self.locked = true;
    }

    pub(crate) fn unlock(&mut self) {
        self.locked = false;
    }

    /// Write the result of resolving a suggestion. This is the one content
    /// path that is open while locked.
    pub(crate) fn commit_resolved(&mut self, html: String) -> ContentChange {
        self.replace(html);
        self.change(false)
    }

    fn replace(&mut self, html: String) {
        self.word_count = html::word_count(&html);
        self.content = html;
    }

    fn change(&self, refocus: bool) -> ContentChange {
        ContentChange {
            html: self.content.clone(),
            word_count: self.word_count,
            refocus,
        }
    }

    /// Clamp `caret` onto a char boundary that is not inside a tag or an
    /// entity reference.
    fn snap_caret(&self, caret: usize) -> usize {
        let content = &self.content;
        let mut at = caret.min(content.len());
        while at > 0 && !content.is_char_boundary(at) {
            at -= 1;
        }
        let Ok(tokens) = tokenize(content) else {
            return content.len();
        };
        let at = tokens
            .iter()
            .find(|t| !t.is_text() && t.span.start < at && at < t.span.end)
            .map_or(at, |t| t.span.end);
        html::entity_containing(content, at).map_or(at, |entity| entity.end)
    }
}

/// Sanitized HTML for a paste, degrading to the plain-text path whenever
/// the HTML flavor is missing, malformed or empty after sanitizing.
fn paste_fragment(payload: &ClipboardPayload) -> Option<String> {
    if let Some(raw) = payload.html.as_deref().filter(|h| !h.trim().is_empty()) {
        match sanitize_html(raw) {
            Ok(clean) if !html::text_content(&clean).trim().is_empty() => return Some(clean),
            Ok(_) => debug!("pasted html had no text after sanitizing"),
            Err(e) => {
                warn!("pasted html could not be parsed ({e}); using plain text");
                let text = payload.text.as_deref().unwrap_or(raw);
                return non_empty_text(text).map(text_to_html);
            }
        }
    }
    payload.text.as_deref().and_then(non_empty_text).map(text_to_html)
}

fn non_empty_text(text: &str) -> Option<&str> {
    (!text.trim().is_empty()).then_some(text)
}

fn is_block_tag(name: &str) -> bool {
    name != "br" && BLOCK_TAGS.contains(&name)
}

/// Elements still open at byte `at`, outermost first, with the span of
/// each start tag.
fn open_elements(tokens: &[Token], at: usize) -> Vec<(&str, Range<usize>)> {
    let mut open: Vec<(&str, Range<usize>)> = Vec::new();
    for token in tokens.iter().take_while(|t| t.span.end <= at) {
        match &token.kind {
            TokenKind::StartTag { name, self_closing } => {
                if !self_closing && !VOID_TAGS.contains(&name.as_str()) {
                    open.push((name.as_str(), token.span.clone()));
                }
            }
            TokenKind::EndTag { name } => {
                if let Some(pos) = open.iter().rposition(|(n, _)| *n == name.as_str()) {
                    open.truncate(pos);
                }
            }
            _ => {}
        }
    }
    open
}

/// Inner content of a fragment that is exactly one `<p>` with no nested
/// blocks.
fn lone_paragraph_body<'a>(fragment: &'a str, tokens: &[Token]) -> Option<&'a str> {
    let (first, rest) = tokens.split_first()?;
    let (last, inner) = rest.split_last()?;
    let is_p_start = matches!(&first.kind, TokenKind::StartTag { name, .. } if name == "p");
    let is_p_end = matches!(&last.kind, TokenKind::EndTag { name } if name == "p");
    let nested_block = inner
        .iter()
        .filter_map(|t| t.tag_name())
        .any(is_block_tag);
    let whole = first.span.start == 0 && last.span.end == fragment.len();
    (is_p_start && is_p_end && whole && !nested_block)
        .then(|| &fragment[first.span.end..last.span.start])
}

/// Insert `fragment` at `at` so block content is never nested inside the
/// element holding the caret. A single pasted paragraph merges into the
/// surrounding one; anything else with blocks splits the open elements
/// around the fragment and reopens them after it.
fn insert_fragment(content: &str, at: usize, fragment: &str) -> String {
    let splice = |at: usize, piece: &str| {
        let mut out = content.to_string();
        out.insert_str(at, piece);
        out
    };

    let (Ok(doc_tokens), Ok(frag_tokens)) = (tokenize(content), tokenize(fragment)) else {
        return splice(at, fragment);
    };
    let open = open_elements(&doc_tokens, at);
    let has_blocks = frag_tokens
        .iter()
        .filter_map(|t| t.tag_name())
        .any(is_block_tag);
    if open.is_empty() || !has_blocks {
        return splice(at, fragment);
    }

    let innermost = open.last().map(|(name, _)| *name);
    if !matches!(innermost, Some("ul" | "ol")) {
        if let Some(body) = lone_paragraph_body(fragment, &frag_tokens) {
            return splice(at, body);
        }
    }

    // Caret right after the open start tags: the fragment goes before them.
    let leading_edge = open.last().map(|(_, span)| span.end) == Some(at)
        && open.windows(2).all(|w| w[0].1.end == w[1].1.start);
    if leading_edge {
        return splice(open[0].1.start, fragment);
    }

    let closers: String = open.iter().rev().map(|(name, _)| format!("</{name}>")).collect();
    if content[at..].starts_with(&closers) {
        return splice(at + closers.len(), fragment);
    }

    debug!(depth = open.len(), "splitting open elements around pasted blocks");
    let reopeners: String = open.iter().map(|(_, span)| &content[span.clone()]).collect();
    let mut out = String::with_capacity(content.len() + fragment.len() + closers.len() * 2);
    out.push_str(&content[..at]);
    out.push_str(&closers);
    out.push_str(fragment);
    out.push_str(&reopeners);
    out.push_str(&content[at..]);
    out
}
