//! Annotated, read-only rendering of the document with pending
//! suggestions overlaid.
//!
//! Rendering is a pure function of the document and the pending list. The
//! document itself is never modified here; the overlay markup only exists
//! in the returned view.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::advisory::EditSuggestion;
use crate::html::escape_html;
use crate::matcher::{locate, replacement_html, MatchKind, SuggestionMatch};

/// How the pending set was produced. A lone suggestion from a direct
/// request reads as reversible ("Undo"); a batch offers "Reject".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewVariant {
    Single,
    #[default]
    Batch,
}

impl ReviewVariant {
    pub fn reject_label(self) -> &'static str {
        match self {
            ReviewVariant::Single => "Undo",
            ReviewVariant::Batch => "Reject",
        }
    }
}

/// An affordance click decoded from the overlay's `data-action` and
/// `data-index` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "index", rename_all = "snake_case")]
pub enum ControlAction {
    Keep(usize),
    Reject(usize),
}

impl ControlAction {
    pub fn from_attributes(action: &str, index: &str) -> Option<Self> {
        let index = index.trim().parse().ok()?;
        match action.trim() {
            "keep" => Some(ControlAction::Keep(index)),
            "reject" => Some(ControlAction::Reject(index)),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            ControlAction::Keep(i) | ControlAction::Reject(i) => i,
        }
    }
}

/// One overlay placed in the rendered view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayInfo {
    pub index: usize,
    /// Byte range of the matched text in the source document.
    pub range: Range<usize>,
    pub kind: MatchKind,
    pub label: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedView {
    pub html: String,
    /// False whenever overlays are shown.
    pub editable: bool,
    /// Overlays in document order.
    pub overlays: Vec<OverlayInfo>,
    /// Pending indices not shown: unmatched, or overlapping a lower index.
    pub deferred: Vec<usize>,
}

/// Render `pending` over `document`.
///
/// Every suggestion is located in the same unmodified `document`. Where
/// two matches overlap the lower index is shown and the other deferred
/// until the conflict resolves.
pub fn render_annotated(
    document: &str,
    pending: &[EditSuggestion],
    variant: ReviewVariant,
) -> AnnotatedView {
    if pending.is_empty() {
        return AnnotatedView {
            html: document.to_string(),
            editable: true,
            overlays: Vec::new(),
            deferred: Vec::new(),
        };
    }

    let mut placed: Vec<(usize, SuggestionMatch)> = Vec::new();
    let mut deferred = Vec::new();
    for (index, suggestion) in pending.iter().enumerate() {
        match locate(document, suggestion) {
            Some(found) if placed.iter().all(|(_, p)| !p.overlaps(&found)) => {
                placed.push((index, found));
            }
            Some(_) => {
                debug!(index, "suggestion overlaps an earlier one, deferred");
                deferred.push(index);
            }
            None => {
                debug!(index, "pending suggestion no longer matches, deferred");
                deferred.push(index);
            }
        }
    }

    placed.sort_by_key(|(_, found)| found.range.start);

    let mut html = document.to_string();
    for (index, found) in placed.iter().rev() {
        let markup = overlay_html(
            *index,
            &document[found.range.clone()],
            &pending[*index],
            variant,
        );
        html.replace_range(found.range.clone(), &markup);
    }

    let overlays = placed
        .into_iter()
        .map(|(index, found)| OverlayInfo {
            index,
            range: found.range,
            kind: found.kind,
            label: format!("Suggestion {}", index + 1),
            explanation: pending[index].explanation.clone(),
        })
        .collect();

    AnnotatedView {
        html,
        editable: false,
        overlays,
        deferred,
    }
}

/// Overlay markup for suggestion `index`. `matched` is the slice of the
/// document being replaced and is already valid HTML text.
fn overlay_html(
    index: usize,
    matched: &str,
    suggestion: &EditSuggestion,
    variant: ReviewVariant,
) -> String {
    format!(
        "<span class=\"edit-suggestion\" data-suggestion-index=\"{index}\" title=\"{title}\">\
         <del class=\"original-text\">{matched}</del>\
         <ins class=\"suggested-text\">{suggested}</ins>\
         <span class=\"suggestion-controls\">\
         <span class=\"suggestion-label\">Suggestion {number}</span>\
         <button type=\"button\" class=\"keep-suggestion-btn\" data-action=\"keep\" data-index=\"{index}\">Keep</button>\
         <button type=\"button\" class=\"reject-suggestion-btn\" data-action=\"reject\" data-index=\"{index}\">{reject}</button>\
         </span></span>",
        title = escape_html(&suggestion.explanation),
        suggested = replacement_html(&suggestion.suggested_text),
        number = index + 1,
        reject = variant.reject_label(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pending_renders_plain_editable_document() {
        let view = render_annotated("<p>hi</p>", &[], ReviewVariant::Batch);
        assert_eq!(view.html, "<p>hi</p>");
        assert!(view.editable);
        assert!(view.overlays.is_empty());
    }

    #[test]
    fn test_single_overlay_markup() {
        let doc = "<p>I learned a lot.</p>";
        let pending = vec![EditSuggestion::new("I learned a lot.", "I **grew**.", "Be <specific>")];
        let view = render_annotated(doc, &pending, ReviewVariant::Single);

        assert!(!view.editable);
        assert!(view.html.starts_with("<p><span class=\"edit-suggestion\" data-suggestion-index=\"0\""));
        assert!(view.html.contains("title=\"Be &lt;specific&gt;\""));
        assert!(view.html.contains("<del class=\"original-text\">I learned a lot.</del>"));
        assert!(view.html.contains("<ins class=\"suggested-text\">I <strong>grew</strong>.</ins>"));
        assert!(view.html.contains("Suggestion 1"));
        assert!(view.html.contains(">Undo</button>"));
        assert!(view.html.ends_with("</span></span></p>"));
        assert_eq!(view.overlays[0].range, 3..19);
    }

    #[test]
    fn test_batch_overlays_use_pristine_offsets() {
        let doc = "<p>alpha beta gamma</p>";
        let pending = vec![
            EditSuggestion::new("gamma", "G", "x"),
            EditSuggestion::new("alpha", "A", "y"),
        ];
        let view = render_annotated(doc, &pending, ReviewVariant::Batch);

        assert_eq!(view.overlays.len(), 2);
        // Document order, not pending order.
        assert_eq!(view.overlays[0].index, 1);
        assert_eq!(view.overlays[1].index, 0);
        assert!(view.html.find("data-suggestion-index=\"1\"") < view.html.find("data-suggestion-index=\"0\""));
        assert!(view.html.contains(">Reject</button>"));
        assert!(view.deferred.is_empty());
    }

    #[test]
    fn test_overlap_defers_higher_index() {
        let doc = "<p>one two three</p>";
        let pending = vec![
            EditSuggestion::new("one two", "x", "a"),
            EditSuggestion::new("two three", "y", "b"),
            EditSuggestion::new("absent", "z", "c"),
        ];
        let view = render_annotated(doc, &pending, ReviewVariant::Batch);
        assert_eq!(view.overlays.len(), 1);
        assert_eq!(view.overlays[0].index, 0);
        assert_eq!(view.deferred, vec![1, 2]);
    }

    #[test]
    fn test_control_action_from_attributes() {
        assert_eq!(ControlAction::from_attributes("keep", "2"), Some(ControlAction::Keep(2)));
        assert_eq!(ControlAction::from_attributes("reject", "0"), Some(ControlAction::Reject(0)));
        assert_eq!(ControlAction::from_attributes("explode", "0"), None);
        assert_eq!(ControlAction::from_attributes("keep", "x"), None);
    }
}
