//! Paste sanitizing: clipboard HTML or text reduced to the document vocabulary.

use lazy_static::lazy_static;
use regex::Regex;

use crate::constants::markup::{DISCARDED_CONTENT_TAGS, VOID_TAGS};
use crate::html::{
    decode_entities, escape_html, is_allowed_tag, is_raw_text_tag, tokenize, HtmlError, TokenKind,
};

lazy_static! {
    static ref BLANK_LINE: Regex = Regex::new(r"\r?\n\r?\n").expect("static blank line pattern");
    static ref LINE_BREAK: Regex = Regex::new(r"\r?\n").expect("static line break pattern");
}

/// Reduce pasted HTML to the allowed vocabulary.
///
/// Disallowed elements are unwrapped (their children stay in place), every
/// attribute is dropped, comments and declarations vanish, and the content
/// of script-like elements is discarded. Unbalanced end tags are ignored
/// and elements left open are closed, so the output is always well formed.
pub fn sanitize_html(input: &str) -> Result<String, HtmlError> {
    let tokens = tokenize(input)?;
    let mut out = String::with_capacity(input.len());
    let mut open: Vec<&str> = Vec::new();
    // Depth inside discarded elements that are not raw text (template, object).
    let mut skip_depth = 0usize;

    for token in &tokens {
        match &token.kind {
            TokenKind::Text => {
                if skip_depth == 0 {
                    let text = decode_entities(&input[token.span.clone()]);
                    out.push_str(&escape_html(&text));
                }
            }
            TokenKind::RawText | TokenKind::Comment | TokenKind::Declaration => {}
            TokenKind::StartTag { name, self_closing } => {
                let name = name.as_str();
                if DISCARDED_CONTENT_TAGS.contains(&name) {
                    if !is_raw_text_tag(name) && !self_closing {
                        skip_depth += 1;
                    }
                    continue;
                }
                if skip_depth > 0 || !is_allowed_tag(name) {
                    continue;
                }
                if VOID_TAGS.contains(&name) {
                    out.push_str(&format!("<{name}>"));
                } else if !self_closing {
                    out.push_str(&format!("<{name}>"));
                    open.push(name);
                }
            }
            TokenKind::EndTag { name } => {
                let name = name.as_str();
                if DISCARDED_CONTENT_TAGS.contains(&name) {
                    if !is_raw_text_tag(name) {
                        skip_depth = skip_depth.saturating_sub(1);
                    }
                    continue;
                }
                if skip_depth > 0 || !is_allowed_tag(name) || VOID_TAGS.contains(&name) {
                    continue;
                }
                if let Some(pos) = open.iter().rposition(|n| *n == name) {
                    while open.len() > pos {
                        if let Some(closed) = open.pop() {
                            out.push_str(&format!("</{closed}>"));
                        }
                    }
                }
            }
        }
    }

    while let Some(closed) = open.pop() {
        out.push_str(&format!("</{closed}>"));
    }

    Ok(out)
}

/// Convert plain clipboard text into paragraphs: blank lines separate
/// paragraphs, single newlines become `<br>`.
pub fn text_to_html(text: &str) -> String {
    BLANK_LINE
        .split(text)
        .map(|paragraph| {
            let escaped = escape_html(paragraph);
            format!("<p>{}</p>", LINE_BREAK.replace_all(&escaped, "<br>"))
        })
        .collect()
}
