//! Lenient tokenizer for the essay markup subset.
//!
//! This is not an HTML5 tokenizer. It recognizes the shapes an essay
//! document or a clipboard fragment actually contains: text, start/end
//! tags with (discarded) attributes, comments, doctypes/processing
//! instructions, and raw-text elements such as `<script>` whose content
//! must never be interpreted as markup.
//!
//! Every token carries the byte span it was read from, so callers can
//! splice the original string without re-serializing it. Span endpoints
//! always fall on ASCII structural bytes and are therefore UTF-8 char
//! boundaries.

use std::ops::Range;

use thiserror::Error;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

/// Elements whose content is raw text up to the matching close tag.
const RAW_TEXT_TAGS: &[&str] = &[
    "script", "style", "textarea", "title", "iframe", "noscript", "xmp",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    StartTag { name: String, self_closing: bool },
    EndTag { name: String },
    /// Content of a raw-text element (script, style, ...).
    RawText,
    Comment,
    /// `<!DOCTYPE ...>`, `<?xml ...?>` and other bang/question constructs.
    Declaration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    pub fn is_text(&self) -> bool {
        self.kind == TokenKind::Text
    }

    pub fn tag_name(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::StartTag { name, .. } | TokenKind::EndTag { name } => Some(name),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HtmlError {
    #[error("unterminated tag at byte {0}")]
    UnterminatedTag(usize),
    #[error("unterminated comment at byte {0}")]
    UnterminatedComment(usize),
    #[error("unterminated attribute value at byte {0}")]
    UnterminatedAttribute(usize),
    #[error("missing </{name}> for element opened at byte {offset}")]
    UnterminatedRawText { name: String, offset: usize },
}

pub(crate) fn is_raw_text_tag(name: &str) -> bool {
    RAW_TEXT_TAGS.contains(&name)
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b':' | b'_' | b'-')
}

fn find_from(input: &str, from: usize, needle: &str) -> Option<usize> {
    input[from..].find(needle).map(|p| from + p)
}

/// Position of the `>` closing a raw-text element's end tag, and the start
/// of that end tag.
fn find_raw_text_close(input: &str, from: usize, name: &str) -> Option<(usize, usize)> {
    let bytes = input.as_bytes();
    let mut i = from;
    while let Some(lt) = find_from(input, i, "</") {
        let name_start = lt + 2;
        let name_end = name_start + name.len();
        if name_end <= bytes.len() && bytes[name_start..name_end].eq_ignore_ascii_case(name.as_bytes())
        {
            let mut k = name_end;
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < bytes.len() && bytes[k] == b'>' {
                return Some((lt, k + 1));
            }
        }
        i = lt + 2;
    }
    None
}

/// Scan past a tag's attributes starting at `i`, returning the index just
/// after the closing `>` and whether the tag was written self-closing.
fn scan_tag_end(input: &str, tag_start: usize, mut i: usize) -> Result<(usize, bool), HtmlError> {
    let bytes = input.as_bytes();
    while i < bytes.len() {
        match bytes[i] {
            b'>' => {
                let self_closing = i > tag_start + 1 && bytes[i - 1] == b'/';
                return Ok((i + 1, self_closing));
            }
            quote @ (b'"' | b'\'') => {
                let close = input[i + 1..]
                    .find(quote as char)
                    .ok_or(HtmlError::UnterminatedAttribute(i))?;
                i += close + 2;
            }
            _ => i += 1,
        }
    }
    Err(HtmlError::UnterminatedTag(tag_start))
}

fn push_text(out: &mut Vec<Token>, span: Range<usize>) {
    if span.is_empty() {
        return;
    }
    if let Some(last) = out.last_mut() {
        if last.is_text() && last.span.end == span.start {
            last.span.end = span.end;
            return;
        }
    }
    out.push(Token {
        kind: TokenKind::Text,
        span,
    });
}

/// Tokenize `input` into spans. Fails on markup that never closes rather
/// than guessing where it ends.
pub fn tokenize(input: &str) -> Result<Vec<Token>, HtmlError> {
    let bytes = input.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            let end = find_from(input, i, "<").unwrap_or(bytes.len());
            push_text(&mut out, i..end);
            i = end;
            continue;
        }

        let start = i;
        let rest = &input[i..];

        if rest.starts_with(COMMENT_START) {
            let end = find_from(input, i + COMMENT_START.len(), COMMENT_END)
                .ok_or(HtmlError::UnterminatedComment(start))?;
            i = end + COMMENT_END.len();
            out.push(Token {
                kind: TokenKind::Comment,
                span: start..i,
            });
            continue;
        }

        let next = bytes.get(i + 1).copied();
        match next {
            Some(b'!') | Some(b'?') => {
                let end = find_from(input, i, ">").ok_or(HtmlError::UnterminatedTag(start))?;
                i = end + 1;
                out.push(Token {
                    kind: TokenKind::Declaration,
                    span: start..i,
                });
            }
            Some(b'/') if bytes.get(i + 2).is_some_and(|b| b.is_ascii_alphabetic()) => {
                let name_start = i + 2;
                let mut name_end = name_start;
                while name_end < bytes.len() && is_name_byte(bytes[name_end]) {
                    name_end += 1;
                }
                let name = input[name_start..name_end].to_ascii_lowercase();
                let (end, _) = scan_tag_end(input, start, name_end)?;
                i = end;
                out.push(Token {
                    kind: TokenKind::EndTag { name },
                    span: start..i,
                });
            }
            Some(b) if b.is_ascii_alphabetic() => {
                let name_start = i + 1;
                let mut name_end = name_start;
                while name_end < bytes.len() && is_name_byte(bytes[name_end]) {
                    name_end += 1;
                }
                let name = input[name_start..name_end].to_ascii_lowercase();
                let (end, self_closing) = scan_tag_end(input, start, name_end)?;
                i = end;

                let raw = is_raw_text_tag(&name) && !self_closing;
                out.push(Token {
                    kind: TokenKind::StartTag {
                        name: name.clone(),
                        self_closing,
                    },
                    span: start..i,
                });

                if raw {
                    let (close_start, close_end) = find_raw_text_close(input, i, &name)
                        .ok_or_else(|| HtmlError::UnterminatedRawText {
                            name: name.clone(),
                            offset: start,
                        })?;
                    if close_start > i {
                        out.push(Token {
                            kind: TokenKind::RawText,
                            span: i..close_start,
                        });
                    }
                    out.push(Token {
                        kind: TokenKind::EndTag { name },
                        span: close_start..close_end,
                    });
                    i = close_end;
                }
            }
            _ => {
                // A bare `<` that does not open markup is ordinary text.
                let end = find_from(input, i + 1, "<").unwrap_or(bytes.len());
                push_text(&mut out, start..end);
                i = end;
            }
        }
    }

    Ok(out)
}
