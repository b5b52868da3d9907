//! The review lifecycle: an explicit editor state object that owns the
//! document surface and the pending suggestion set.
//!
//! ```text
//! Idle ──add_suggestions (≥1 matched)──▶ Reviewing
//!  ▲                                        │
//!  └──── last pending entry kept/rejected ──┘
//! ```
//!
//! The mode is derived from the pending set, and the surface lock follows
//! it. Indices address the pending set as it is *now*: after any `keep` or
//! `reject` the remaining entries shift down.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::advisory::{AdvisoryResponse, EditSuggestion, RequestToken, RequestTracker};
use crate::error::{EssayError, Result};
use crate::html;
use crate::matcher;
use crate::renderer::{render_annotated, AnnotatedView, ControlAction, ReviewVariant};
use crate::storage::{Essay, EssayStore};
use crate::surface::{ClipboardPayload, ContentChange, FormatCommand, RichTextSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewMode {
    /// No suggestions pending; the surface is editable.
    Idle,
    /// One or more suggestions pending; the surface is locked.
    Reviewing,
}

/// What happened to a pending suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// The replacement was written into the document.
    Applied,
    /// Discarded without touching the document.
    Rejected,
    /// Kept, but its original text was gone; discarded like a reject.
    Dropped,
    /// Index out of range. Nothing changed.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOutcome {
    pub admitted: usize,
    pub dropped: usize,
}

/// Result of feeding an advisory response back into the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Superseded by a newer request and ignored.
    Stale,
    /// The advisory call failed; retrying is possible.
    Failed(String),
    /// None of the suggestions could be located in the essay.
    NoActionable { dropped: usize },
    /// Suggestions are pending review; the value is the pending count.
    Reviewing(usize),
}

/// Everything a UI can ask the editor to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorAction {
    SetContent { html: String },
    UserEdit { html: String },
    Paste {
        payload: ClipboardPayload,
        caret: Option<usize>,
    },
    Format {
        command: FormatCommand,
        selection: Range<usize>,
    },
    AddSuggestions { suggestions: Vec<EditSuggestion> },
    Keep { index: usize },
    Reject { index: usize },
    KeepAll,
    RejectAll,
}

/// What a dispatched action did. UIs re-render from [`EssayEditor::view`]
/// after any event other than `Ignored`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    ContentChanged(ContentChange),
    SuggestionsAdded(AddOutcome),
    NoActionableSuggestions { dropped: usize },
    Resolved {
        index: usize,
        resolution: Resolution,
        change: ContentChange,
    },
    AllKept { applied: usize, change: ContentChange },
    AllRejected { discarded: usize },
    /// The action was inert (locked surface, empty paste, bad index).
    Ignored,
}

/// Serializable snapshot of the editor for UI subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorState {
    pub mode: ReviewMode,
    pub content: String,
    pub word_count: usize,
    pub pending: Vec<EditSuggestion>,
    pub busy: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EssayEditor {
    surface: RichTextSurface,
    pending: Vec<EditSuggestion>,
    variant: ReviewVariant,
    requests: RequestTracker,
}

impl EssayEditor {
    pub fn new(content: impl Into<String>) -> Self {
        Self::with_surface(RichTextSurface::new(content))
    }

    pub fn with_surface(surface: RichTextSurface) -> Self {
        Self {
            surface,
            pending: Vec::new(),
            variant: ReviewVariant::default(),
            requests: RequestTracker::new(),
        }
    }

    /// Open a persisted essay for editing.
    pub fn from_essay(essay: &Essay) -> Self {
        let surface = RichTextSurface::new(essay.content.clone()).with_max_words(essay.max_words);
        Self::with_surface(surface)
    }

    // ── State ────────────────────────────────────────────────────────────

    pub fn mode(&self) -> ReviewMode {
        if self.pending.is_empty() {
            ReviewMode::Idle
        } else {
            ReviewMode::Reviewing
        }
    }

    pub fn pending(&self) -> &[EditSuggestion] {
        &self.pending
    }

    pub fn variant(&self) -> ReviewVariant {
        self.variant
    }

    pub fn surface(&self) -> &RichTextSurface {
        &self.surface
    }

    /// The plain document HTML, never overlay markup.
    pub fn content(&self) -> &str {
        self.surface.content()
    }

    pub fn word_count(&self) -> usize {
        self.surface.word_count()
    }

    /// Readable essay text, as sent to the advisory service.
    pub fn plain_text(&self) -> String {
        html::plain_text(self.surface.content())
    }

    pub fn is_busy(&self) -> bool {
        self.requests.is_busy()
    }

    pub fn state(&self) -> EditorState {
        EditorState {
            mode: self.mode(),
            content: self.content().to_string(),
            word_count: self.word_count(),
            pending: self.pending.clone(),
            busy: self.is_busy(),
        }
    }

    /// The annotated view for the current state.
    pub fn view(&self) -> AnnotatedView {
        render_annotated(self.surface.content(), &self.pending, self.variant)
    }

    // ── Editing ──────────────────────────────────────────────────────────

    pub fn set_content(&mut self, html: impl Into<String>) -> bool {
        self.surface.set_content(html)
    }

    pub fn on_user_edit(&mut self, html: impl Into<String>) -> Option<ContentChange> {
        self.surface.on_user_edit(html)
    }

    pub fn on_paste(
        &mut self,
        payload: &ClipboardPayload,
        caret: Option<usize>,
    ) -> Option<ContentChange> {
        self.surface.on_paste(payload, caret)
    }

    pub fn apply_format(
        &mut self,
        command: FormatCommand,
        selection: Range<usize>,
    ) -> Option<ContentChange> {
        self.surface.apply_format(command, selection)
    }

    // ── Suggestions ──────────────────────────────────────────────────────

    /// Admit every suggestion whose original text can be located in the
    /// current document. Admitted entries are appended to anything already
    /// pending. Fails with [`EssayError::NoActionableSuggestions`] when
    /// nothing was admitted, in which case no state changes.
    pub fn add_suggestions(&mut self, suggestions: Vec<EditSuggestion>) -> Result<AddOutcome> {
        let was_idle = self.pending.is_empty();
        let mut admitted = 0;
        let mut dropped = 0;

        for suggestion in suggestions {
            if matcher::is_applicable(self.surface.content(), &suggestion) {
                self.pending.push(suggestion);
                admitted += 1;
            } else {
                warn!(
                    "could not find text to replace: {:?}",
                    truncate_for_log(&suggestion.original_text)
                );
                dropped += 1;
            }
        }

        if admitted == 0 {
            return Err(EssayError::NoActionableSuggestions { dropped });
        }

        self.variant = if was_idle && admitted == 1 {
            ReviewVariant::Single
        } else {
            ReviewVariant::Batch
        };
        self.surface.lock();
        info!(admitted, dropped, pending = self.pending.len(), "suggestions under review");
        Ok(AddOutcome { admitted, dropped })
    }

    /// Commit suggestion `index` into the live document.
    pub fn keep(&mut self, index: usize) -> Resolution {
        if index >= self.pending.len() {
            debug!(index, pending = self.pending.len(), "keep ignored: index out of range");
            return Resolution::Ignored;
        }
        let suggestion = self.pending.remove(index);
        let resolution = match matcher::apply(self.surface.content(), &suggestion) {
            Some(updated) => {
                self.surface.commit_resolved(updated);
                Resolution::Applied
            }
            None => {
                warn!(index, "original text no longer present; suggestion dropped");
                Resolution::Dropped
            }
        };
        self.prune_unmatched();
        self.settle_mode();
        resolution
    }

    /// Drop pending entries whose original text no longer occurs in the
    /// document. Returns how many were dropped.
    fn prune_unmatched(&mut self) -> usize {
        let before = self.pending.len();
        let content = self.surface.content();
        self.pending.retain(|suggestion| {
            let still_matches = matcher::is_applicable(content, suggestion);
            if !still_matches {
                warn!(
                    "pending suggestion no longer matches, dropped: {:?}",
                    truncate_for_log(&suggestion.original_text)
                );
            }
            still_matches
        });
        before - self.pending.len()
    }

    /// Discard suggestion `index` without touching the document.
    pub fn reject(&mut self, index: usize) -> Resolution {
        if index >= self.pending.len() {
            debug!(index, pending = self.pending.len(), "reject ignored: index out of range");
            return Resolution::Ignored;
        }
        self.pending.remove(index);
        self.settle_mode();
        Resolution::Rejected
    }

    /// Keep every pending suggestion. Returns how many were applied.
    ///
    /// Each round applies exactly the overlays the annotated view shows, so
    /// where two suggestions overlap the visible one wins. Deferred entries
    /// that still match after a round surface in the next one.
    pub fn keep_all(&mut self) -> usize {
        let mut applied = 0;
        while !self.pending.is_empty() {
            let view = self.view();
            if view.overlays.is_empty() {
                warn!(pending = self.pending.len(), "no pending suggestion matches; dropping all");
                self.pending.clear();
                break;
            }

            let mut updated = self.surface.content().to_string();
            for overlay in view.overlays.iter().rev() {
                let suggestion = &self.pending[overlay.index];
                let replacement = matcher::replacement_html(&suggestion.suggested_text);
                updated.replace_range(overlay.range.clone(), &replacement);
            }
            let mut shown: Vec<usize> = view.overlays.iter().map(|o| o.index).collect();
            shown.sort_unstable_by(|a, b| b.cmp(a));
            for index in shown {
                self.pending.remove(index);
                applied += 1;
            }
            self.surface.commit_resolved(updated);
            self.prune_unmatched();
        }
        self.settle_mode();
        applied
    }

    /// Discard every pending suggestion. Returns how many were discarded.
    pub fn reject_all(&mut self) -> usize {
        let discarded = self.pending.len();
        self.pending.clear();
        self.settle_mode();
        discarded
    }

    /// Apply an overlay control click.
    pub fn resolve(&mut self, action: ControlAction) -> Resolution {
        match action {
            ControlAction::Keep(index) => self.keep(index),
            ControlAction::Reject(index) => self.reject(index),
        }
    }

    fn settle_mode(&mut self) {
        if self.pending.is_empty() {
            self.surface.unlock();
            self.variant = ReviewVariant::default();
            debug!("review finished; editing restored");
        }
    }

    // ── Dispatch ─────────────────────────────────────────────────────────

    /// Single entry point for UI bindings.
    pub fn dispatch(&mut self, action: EditorAction) -> EditorEvent {
        match action {
            EditorAction::SetContent { html } => {
                if self.set_content(html) {
                    EditorEvent::ContentChanged(self.current_change(false))
                } else {
                    EditorEvent::Ignored
                }
            }
            EditorAction::UserEdit { html } => {
                self.on_user_edit(html).map_or(EditorEvent::Ignored, EditorEvent::ContentChanged)
            }
            EditorAction::Paste { payload, caret } => self
                .on_paste(&payload, caret)
                .map_or(EditorEvent::Ignored, EditorEvent::ContentChanged),
            EditorAction::Format { command, selection } => self
                .apply_format(command, selection)
                .map_or(EditorEvent::Ignored, EditorEvent::ContentChanged),
            EditorAction::AddSuggestions { suggestions } => match self.add_suggestions(suggestions) {
                Ok(outcome) => EditorEvent::SuggestionsAdded(outcome),
                Err(EssayError::NoActionableSuggestions { dropped }) => {
                    EditorEvent::NoActionableSuggestions { dropped }
                }
                Err(e) => {
                    warn!("add_suggestions failed: {e}");
                    EditorEvent::Ignored
                }
            },
            EditorAction::Keep { index } => self.resolved_event(index, |editor| editor.keep(index)),
            EditorAction::Reject { index } => {
                self.resolved_event(index, |editor| editor.reject(index))
            }
            EditorAction::KeepAll => {
                let applied = self.keep_all();
                EditorEvent::AllKept {
                    applied,
                    change: self.current_change(false),
                }
            }
            EditorAction::RejectAll => EditorEvent::AllRejected {
                discarded: self.reject_all(),
            },
        }
    }

    fn resolved_event(
        &mut self,
        index: usize,
        resolve: impl FnOnce(&mut Self) -> Resolution,
    ) -> EditorEvent {
        match resolve(self) {
            Resolution::Ignored => EditorEvent::Ignored,
            resolution => EditorEvent::Resolved {
                index,
                resolution,
                change: self.current_change(false),
            },
        }
    }

    fn current_change(&self, refocus: bool) -> ContentChange {
        ContentChange {
            html: self.content().to_string(),
            word_count: self.word_count(),
            refocus,
        }
    }

    // ── Advisory requests ────────────────────────────────────────────────

    /// Start an advisory request. Any earlier request still in flight is
    /// superseded. The document stays editable until suggestions arrive.
    pub fn begin_request(&mut self) -> RequestToken {
        self.requests.issue()
    }

    /// Abandon the request in flight; its response will be ignored.
    pub fn cancel_request(&mut self) {
        self.requests.invalidate();
    }

    /// Feed a completed advisory call back in. Stale responses and
    /// failures never touch the document or the pending set.
    pub fn receive(&mut self, response: AdvisoryResponse) -> ReceiveOutcome {
        if !self.requests.settle(response.token) {
            return ReceiveOutcome::Stale;
        }
        let suggestions = match response.result {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!("advisory request failed: {e}");
                return ReceiveOutcome::Failed(e.to_string());
            }
        };
        let received = suggestions.len();
        let complete: Vec<EditSuggestion> = suggestions
            .into_iter()
            .filter(EditSuggestion::is_complete)
            .collect();
        let incomplete = received - complete.len();
        match self.add_suggestions(complete) {
            Ok(_) => ReceiveOutcome::Reviewing(self.pending.len()),
            Err(EssayError::NoActionableSuggestions { dropped }) => ReceiveOutcome::NoActionable {
                dropped: dropped + incomplete,
            },
            Err(e) => ReceiveOutcome::Failed(e.to_string()),
        }
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Save the plain document to `store`.
    pub async fn save_to(&self, store: &dyn EssayStore, id: &str) -> Result<Essay> {
        store.save_essay(id, self.content(), self.word_count()).await
    }
}

fn truncate_for_log(text: &str) -> &str {
    crate::advisory::truncate_chars(text, 50)
}
