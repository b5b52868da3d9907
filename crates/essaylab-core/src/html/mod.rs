//! Constrained-HTML primitives shared by the surface, matcher and renderer.

mod entities;
mod tokenizer;

pub use entities::{decode_entities, entity_containing, escape_html};
pub(crate) use tokenizer::is_raw_text_tag;
pub use tokenizer::{tokenize, HtmlError, Token, TokenKind};

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;

use crate::constants::markup::{ALLOWED_TAGS, BLOCK_TAGS};

lazy_static! {
    static ref TAG_PATTERN: Regex = Regex::new(r"<[^>]*>").expect("static tag pattern");
}

pub fn is_allowed_tag(name: &str) -> bool {
    ALLOWED_TAGS.contains(&name)
}

fn is_block_tag(name: &str) -> bool {
    BLOCK_TAGS.contains(&name)
}

/// Text of the document with tags removed and entities decoded, exactly as
/// a DOM `textContent` read would produce it (no separators between
/// blocks). Markup that fails to tokenize is stripped with a regex.
pub fn text_content(html: &str) -> String {
    match tokenize(html) {
        Ok(tokens) => tokens
            .iter()
            .filter(|t| t.is_text())
            .map(|t| decode_entities(&html[t.span.clone()]))
            .collect(),
        Err(e) => {
            tracing::debug!("text_content fallback to regex strip: {e}");
            decode_entities(&TAG_PATTERN.replace_all(html, ""))
        }
    }
}

/// Readable plain text: like [`text_content`] but block boundaries become
/// newlines. This is what gets counted and what gets sent to the advisor.
pub fn plain_text(html: &str) -> String {
    let tokens = match tokenize(html) {
        Ok(tokens) => tokens,
        Err(_) => return decode_entities(&TAG_PATTERN.replace_all(html, " ")),
    };

    let mut out = String::with_capacity(html.len());
    for token in &tokens {
        match &token.kind {
            TokenKind::Text => out.push_str(&decode_entities(&html[token.span.clone()])),
            TokenKind::StartTag { name, .. } | TokenKind::EndTag { name } if is_block_tag(name) => {
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Number of whitespace-separated words in the document.
pub fn word_count(html: &str) -> usize {
    plain_text(html).split_whitespace().count()
}

/// Byte ranges of the text runs in `html`: everything outside tags,
/// comments, declarations and raw-text element content.
pub fn text_runs(html: &str) -> Result<Vec<Range<usize>>, HtmlError> {
    Ok(tokenize(html)?
        .into_iter()
        .filter(|t| t.is_text())
        .map(|t| t.span)
        .collect())
}
