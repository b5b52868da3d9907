use essaylab_core::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("essaylab_core=debug")
        .try_init();
}

fn suggestion(original: &str, suggested: &str) -> EditSuggestion {
    EditSuggestion::new(original, suggested, "Tighter phrasing.")
}

// ========================================================================
// Matching and keeping
// ========================================================================

#[test]
fn test_keep_replaces_first_occurrence_only() {
    init_tracing();
    let doc = "<p>The team won. The team celebrated.</p>";
    let mut editor = EssayEditor::new(doc);
    editor
        .add_suggestions(vec![suggestion("The team", "Our squad")])
        .unwrap();

    assert_eq!(editor.keep(0), Resolution::Applied);
    assert_eq!(editor.content(), "<p>Our squad won. The team celebrated.</p>");
}

#[test]
fn test_keep_all_matches_individual_keeps() {
    let doc = "<h2>Why Nursing</h2><p>I was nervous.</p><p>It was hard.</p><p>I grew.</p>";
    let batch = vec![
        suggestion("I was nervous.", "My hands shook."),
        suggestion("It was hard.", "Every shift tested me."),
        suggestion("I grew.", "I became someone patients trusted."),
    ];

    let mut all = EssayEditor::new(doc);
    all.add_suggestions(batch.clone()).unwrap();
    assert_eq!(all.keep_all(), 3);

    let mut forward = EssayEditor::new(doc);
    forward.add_suggestions(batch.clone()).unwrap();
    while !forward.pending().is_empty() {
        forward.keep(0);
    }

    let mut middle_first = EssayEditor::new(doc);
    middle_first.add_suggestions(batch).unwrap();
    middle_first.keep(1);
    middle_first.keep(1);
    middle_first.keep(0);

    assert_eq!(all.content(), forward.content());
    assert_eq!(all.content(), middle_first.content());
    assert_eq!(all.mode(), ReviewMode::Idle);
    assert_eq!(all.word_count(), 2 + 3 + 4 + 5);
}

#[test]
fn test_reject_all_after_several_batches_is_byte_identical() {
    let doc = "<p>Tom &amp; Jerry met <em>again</em>.</p><ul><li>first</li></ul>";
    let mut editor = EssayEditor::new(doc);
    editor
        .add_suggestions(vec![suggestion("Tom & Jerry", "The pair")])
        .unwrap();
    editor
        .add_suggestions(vec![suggestion("first", "primary"), suggestion("missing", "x")])
        .unwrap();
    assert_eq!(editor.pending().len(), 2);

    editor.reject_all();
    assert_eq!(editor.content(), doc);
    assert!(editor.view().editable);
    assert_eq!(editor.view().html, doc);
}

#[test]
fn test_mixed_batch_admits_only_matches() {
    let mut editor = EssayEditor::new("<p>alpha beta</p>");
    let outcome = editor
        .add_suggestions(vec![
            suggestion("alpha", "A"),
            suggestion("omega", "O"),
            suggestion("", "empty"),
        ])
        .unwrap();
    assert_eq!(outcome.admitted, 1);
    assert_eq!(outcome.dropped, 2);
    assert_eq!(editor.pending(), &[suggestion("alpha", "A")]);
}

#[test]
fn test_keep_converts_markdown_replacement() {
    let mut editor = EssayEditor::new("<p>It was fine.</p>");
    editor
        .add_suggestions(vec![suggestion("It was fine.", "It was **transformative**.")])
        .unwrap();
    editor.keep(0);
    assert_eq!(editor.content(), "<p>It was <strong>transformative</strong>.</p>");
}

#[test]
fn test_keep_that_consumes_another_entry_ends_review() {
    init_tracing();
    let mut editor = EssayEditor::new("<p>I was very nervous.</p>");
    editor
        .add_suggestions(vec![
            suggestion("I was very nervous.", "My hands shook."),
            suggestion("very nervous", "terrified"),
        ])
        .unwrap();
    assert_eq!(editor.mode(), ReviewMode::Reviewing);

    assert_eq!(editor.keep(0), Resolution::Applied);
    assert!(editor.pending().is_empty());
    assert_eq!(editor.mode(), ReviewMode::Idle);
    assert!(!editor.surface().is_locked());
    assert!(editor.view().editable);

    assert!(editor.set_content("<p>My hands shook badly.</p>"));
    assert_eq!(editor.word_count(), 4);
}

#[test]
fn test_keep_all_applies_the_visible_overlay_when_suggestions_overlap() {
    let mut editor = EssayEditor::new("<p>one two three</p>");
    editor
        .add_suggestions(vec![suggestion("one two", "X"), suggestion("two three", "Y")])
        .unwrap();
    let shown = editor.view();
    assert_eq!(shown.overlays.len(), 1);
    assert_eq!(shown.overlays[0].index, 0);

    match editor.dispatch(EditorAction::KeepAll) {
        EditorEvent::AllKept { applied, change } => {
            assert_eq!(applied, 1);
            assert_eq!(change.html, "<p>X three</p>");
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(editor.mode(), ReviewMode::Idle);
}

#[test]
fn test_suggestion_ending_in_ampersand_keeps_entity_whole() {
    let mut editor = EssayEditor::new("<p>Salt &amp; pepper</p>");
    editor
        .add_suggestions(vec![suggestion("Salt &", "Salt and")])
        .unwrap();
    assert_eq!(editor.keep(0), Resolution::Applied);
    assert_eq!(editor.content(), "<p>Salt and pepper</p>");
    assert_eq!(editor.plain_text(), "Salt and pepper");
}

// ========================================================================
// Rendering while reviewing
// ========================================================================

#[test]
fn test_view_shows_overlays_and_controls() {
    let mut editor = EssayEditor::new("<p>one. two.</p>");
    editor
        .add_suggestions(vec![suggestion("one.", "1."), suggestion("two.", "2.")])
        .unwrap();

    let view = editor.view();
    assert!(!view.editable);
    assert_eq!(view.overlays.len(), 2);
    assert!(view.html.contains("data-action=\"keep\" data-index=\"1\""));
    assert!(view.html.contains("Suggestion 2"));
    // The document itself never carries overlay markup.
    assert_eq!(editor.content(), "<p>one. two.</p>");

    editor.keep(0);
    let view = editor.view();
    assert_eq!(view.overlays.len(), 1);
    assert_eq!(view.overlays[0].index, 0);
    assert!(view.html.contains("<del class=\"original-text\">two.</del>"));
}

#[test]
fn test_overlapping_suggestion_surfaces_after_conflict_resolves() {
    let mut editor = EssayEditor::new("<p>very very good</p>");
    editor
        .add_suggestions(vec![suggestion("very very good", "excellent"), suggestion("good", "fine")])
        .unwrap();
    assert_eq!(editor.view().deferred, vec![1]);

    editor.reject(0);
    let view = editor.view();
    assert!(view.deferred.is_empty());
    assert_eq!(view.overlays[0].index, 0);
}

// ========================================================================
// Surface behaviour through the dispatcher
// ========================================================================

#[test]
fn test_paste_sanitizes_and_counts() {
    let mut editor = EssayEditor::new("");
    let event = editor.dispatch(EditorAction::Paste {
        payload: ClipboardPayload::html("<script>alert(1)</script><b>hi</b>"),
        caret: None,
    });
    match event {
        EditorEvent::ContentChanged(change) => {
            assert!(!change.html.contains("<script"));
            assert!(!html::plain_text(&change.html).contains("alert"));
            assert!(change.html.contains("hi"));
            assert_eq!(change.word_count, 1);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_paste_inside_paragraph_does_not_nest_blocks() {
    let mut editor = EssayEditor::new("<p>hello world</p>");
    editor.dispatch(EditorAction::Paste {
        payload: ClipboardPayload::text("pasted "),
        caret: Some("<p>hello ".len()),
    });
    assert_eq!(editor.content(), "<p>hello pasted world</p>");

    editor.dispatch(EditorAction::Paste {
        payload: ClipboardPayload::html("<p>First.</p><p>Second.</p>"),
        caret: Some("<p>hello ".len()),
    });
    assert_eq!(
        editor.content(),
        "<p>hello </p><p>First.</p><p>Second.</p><p>pasted world</p>"
    );
    assert!(!editor.content().contains("<p><p>"));
}

#[test]
fn test_format_is_inert_while_reviewing() {
    let mut editor = EssayEditor::new("<p>bold me</p>");
    editor.add_suggestions(vec![suggestion("bold", "brave")]).unwrap();
    let event = editor.dispatch(EditorAction::Format {
        command: FormatCommand::Bold,
        selection: 3..7,
    });
    assert_eq!(event, EditorEvent::Ignored);

    editor.dispatch(EditorAction::RejectAll);
    let event = editor.dispatch(EditorAction::Format {
        command: FormatCommand::Bold,
        selection: 3..7,
    });
    assert!(matches!(event, EditorEvent::ContentChanged(ref c) if c.refocus));
    assert_eq!(editor.content(), "<p><strong>bold</strong> me</p>");
}

#[test]
fn test_actions_deserialize_from_ui_json() {
    let action: EditorAction = serde_json::from_str(r#"{"type": "keep", "index": 2}"#).unwrap();
    assert_eq!(action, EditorAction::Keep { index: 2 });

    let action: EditorAction = serde_json::from_str(
        r#"{"type": "add_suggestions", "suggestions": [
            {"originalText": "a", "suggestedText": "b", "explanation": "c"}
        ]}"#,
    )
    .unwrap();
    assert!(matches!(action, EditorAction::AddSuggestions { ref suggestions } if suggestions.len() == 1));
}
