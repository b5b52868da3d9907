use essaylab_core::*;
use tempfile::TempDir;

// ========================================================================
// FileEssayStore
// ========================================================================

#[tokio::test]
async fn test_editor_save_persists_plain_document_only() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileEssayStore::with_dir(temp_dir.path()).unwrap();
    let essay = store.create_essay("Common App", None).await.unwrap();

    let mut editor = EssayEditor::from_essay(&essay);
    editor.on_user_edit("<p>I learned a lot from this experience.</p>");
    editor
        .add_suggestions(vec![EditSuggestion::new(
            "I learned a lot",
            "I grew",
            "Concise.",
        )])
        .unwrap();

    // Saving mid-review writes the document, not the overlay.
    let saved = editor.save_to(&store, &essay.id).await.unwrap();
    assert!(!saved.content.contains("edit-suggestion"));
    assert_eq!(saved.word_count, 7);

    editor.keep(0);
    editor.save_to(&store, &essay.id).await.unwrap();

    let reloaded = store.load_essay(&essay.id).await.unwrap();
    assert_eq!(reloaded.content, "<p>I grew from this experience.</p>");
    assert_eq!(reloaded.word_count, 5);

    let reopened = EssayEditor::from_essay(&reloaded);
    assert_eq!(reopened.content(), reloaded.content);
    assert_eq!(reopened.mode(), ReviewMode::Idle);
}

#[tokio::test]
async fn test_list_is_most_recent_first() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileEssayStore::with_dir(temp_dir.path()).unwrap();
    let older = store.create_essay("Older", None).await.unwrap();
    let newer = store
        .create_essay("Newer", Some("Supplemental".to_string()))
        .await
        .unwrap();
    store.save_essay(&newer.id, "<p>fresh</p>", 1).await.unwrap();

    let list = store.list_essays().await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, newer.id);
    assert_eq!(list[0].essay_type, "Supplemental");
    assert_eq!(list[1].id, older.id);
}

#[tokio::test]
async fn test_delete_then_load_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileEssayStore::with_dir(temp_dir.path()).unwrap();
    let essay = store.create_essay("Gone", None).await.unwrap();
    store.delete_essay(&essay.id).await.unwrap();
    assert!(matches!(
        store.load_essay(&essay.id).await,
        Err(EssayError::NotFound(_))
    ));
}

// ========================================================================
// MemoryEssayStore behind the trait object
// ========================================================================

#[tokio::test]
async fn test_memory_store_through_trait_object() {
    let store: Box<dyn EssayStore> = Box::new(MemoryEssayStore::new());
    let essay = store.create_essay("Draft", None).await.unwrap();
    let editor = EssayEditor::new("<p>two words</p>");
    editor.save_to(store.as_ref(), &essay.id).await.unwrap();
    assert_eq!(store.load_essay(&essay.id).await.unwrap().word_count, 2);
}

// ========================================================================
// Settings
// ========================================================================

#[test]
fn test_settings_roundtrip_through_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let mut settings = Settings::default();
    settings.advisory.timeout_secs = 12;
    settings.storage.data_dir = Some(temp_dir.path().join("essays"));
    settings.save_to(&config_path).unwrap();

    let loaded = Settings::load_from(&config_path).unwrap();
    assert_eq!(loaded.advisory.timeout_secs, 12);
    let store = loaded.build_store().unwrap();
    assert!(store.dir().ends_with("essays"));
}
