use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::constants::markup::VOID_TAGS;
use crate::html::{entity_containing, tokenize, Token, TokenKind};

/// Toolbar formatting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    BulletList,
}

impl FormatCommand {
    fn inline_tag(self) -> Option<&'static str> {
        match self {
            FormatCommand::Bold => Some("strong"),
            FormatCommand::Italic => Some("em"),
            FormatCommand::Underline => Some("u"),
            FormatCommand::BulletList => None,
        }
    }
}

/// Apply `command` to the byte-range `selection` of `html`. Returns `None`
/// when the command does not change anything (collapsed inline selection,
/// selection outside any text, malformed document).
pub fn apply_format(html: &str, command: FormatCommand, selection: Range<usize>) -> Option<String> {
    let tokens = tokenize(html).ok()?;
    let selection = selection.start.min(html.len())..selection.end.min(html.len());
    match command.inline_tag() {
        Some(tag) => wrap_text_runs(html, &tokens, selection, tag),
        None => make_bullet_list(html, &tokens, selection),
    }
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Move a boundary out of an entity reference such as `&amp;`. Start
/// boundaries move back to the `&`, end boundaries past the `;`.
fn snap_out_of_entity(html: &str, pos: usize, forward: bool) -> usize {
    match entity_containing(html, pos) {
        Some(entity) if forward => entity.end,
        Some(entity) => entity.start,
        None => pos,
    }
}

fn wrap_text_runs(
    html: &str,
    tokens: &[Token],
    selection: Range<usize>,
    tag: &str,
) -> Option<String> {
    if selection.start >= selection.end {
        return None;
    }

    let pieces: Vec<Range<usize>> = tokens
        .iter()
        .filter(|t| t.is_text())
        .filter_map(|t| {
            let start = selection.start.max(t.span.start);
            let end = selection.end.min(t.span.end);
            if start >= end {
                return None;
            }
            let start = snap_out_of_entity(html, floor_char_boundary(html, start), false);
            let end = snap_out_of_entity(html, floor_char_boundary(html, end), true);
            (start < end && !html[start..end].trim().is_empty()).then_some(start..end)
        })
        .collect();

    if pieces.is_empty() {
        return None;
    }

    let mut out = html.to_string();
    for piece in pieces.iter().rev() {
        out.insert_str(piece.end, &format!("</{tag}>"));
        out.insert_str(piece.start, &format!("<{tag}>"));
    }
    Some(out)
}

/// A top-level `<p>` element: the outer span and the span of its content.
struct Paragraph {
    outer: Range<usize>,
    inner: Range<usize>,
}

fn top_level_paragraphs(tokens: &[Token]) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut stack: Vec<(&str, usize, usize)> = Vec::new();

    for token in tokens {
        match &token.kind {
            TokenKind::StartTag { name, self_closing } => {
                if *self_closing || VOID_TAGS.contains(&name.as_str()) {
                    continue;
                }
                stack.push((name.as_str(), token.span.start, token.span.end));
            }
            TokenKind::EndTag { name } => {
                let Some(pos) = stack.iter().rposition(|(n, _, _)| *n == name.as_str()) else {
                    continue;
                };
                let (_, outer_start, inner_start) = stack[pos];
                stack.truncate(pos);
                if name == "p" && stack.is_empty() {
                    paragraphs.push(Paragraph {
                        outer: outer_start..token.span.end,
                        inner: inner_start..token.span.start,
                    });
                }
            }
            _ => {}
        }
    }
    paragraphs
}

fn touches(range: &Range<usize>, selection: &Range<usize>) -> bool {
    if selection.start == selection.end {
        range.start <= selection.start && selection.start <= range.end
    } else {
        range.start < selection.end && selection.start < range.end
    }
}

fn make_bullet_list(html: &str, tokens: &[Token], selection: Range<usize>) -> Option<String> {
    let selected: Vec<Paragraph> = top_level_paragraphs(tokens)
        .into_iter()
        .filter(|p| touches(&p.outer, &selection))
        .collect();

    if selected.is_empty() {
        return bare_text_list(html, tokens, selection);
    }

    // Group paragraphs separated only by whitespace into one list.
    let mut groups: Vec<Vec<&Paragraph>> = Vec::new();
    for paragraph in &selected {
        match groups.last_mut() {
            Some(group)
                if group
                    .last()
                    .is_some_and(|prev| html[prev.outer.end..paragraph.outer.start].trim().is_empty()) =>
            {
                group.push(paragraph);
            }
            _ => groups.push(vec![paragraph]),
        }
    }

    let mut out = html.to_string();
    for group in groups.iter().rev() {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let items: String = group
            .iter()
            .map(|p| format!("<li>{}</li>", &html[p.inner.clone()]))
            .collect();
        out.replace_range(first.outer.start..last.outer.end, &format!("<ul>{items}</ul>"));
    }
    Some(out)
}

/// Bullet a bare top-level text run (a document without paragraphs).
fn bare_text_list(html: &str, tokens: &[Token], selection: Range<usize>) -> Option<String> {
    let mut depth = 0usize;
    for token in tokens {
        match &token.kind {
            TokenKind::StartTag { name, self_closing } => {
                if !*self_closing && !VOID_TAGS.contains(&name.as_str()) {
                    depth += 1;
                }
            }
            TokenKind::EndTag { name } => {
                if !VOID_TAGS.contains(&name.as_str()) {
                    depth = depth.saturating_sub(1);
                }
            }
            TokenKind::Text if depth == 0 && touches(&token.span, &selection) => {
                let text = &html[token.span.clone()];
                if text.trim().is_empty() {
                    continue;
                }
                let mut out = html.to_string();
                out.replace_range(token.span.clone(), &format!("<ul><li>{}</li></ul>", text.trim()));
                return Some(out);
            }
            _ => {}
        }
    }
    None
}
