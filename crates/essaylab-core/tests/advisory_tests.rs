use std::sync::{Arc, Mutex};
use std::time::Duration;

use essaylab_core::advisory::{request_feedback_edits, request_suggestions};
use essaylab_core::llm::ChatOptions;
use essaylab_core::*;

/// Replays canned completions and records what it was sent.
struct MockLlm {
    responses: Arc<Mutex<Vec<String>>>,
    seen: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockLlm {
    fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(
                responses.into_iter().rev().map(String::from).collect(),
            )),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlm {
    async fn chat(
        &self,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Result<LlmResponse, EssayError> {
        assert!(options.json);
        self.seen.lock().unwrap().push(messages.to_vec());
        let content = self
            .responses
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| EssayError::Llm("no more responses".into()))?;
        Ok(LlmResponse {
            message: Message::assistant(content),
            usage: None,
        })
    }

    fn model(&self) -> &str {
        "mock"
    }
}

const ESSAY: &str = "<p>I learned a lot from this experience.</p><p>It changed me.</p>";

#[tokio::test]
async fn test_single_request_flows_into_review() {
    let mock = MockLlm::new(vec![
        r#"```json
{"originalText": "I learned a lot from this experience.",
 "suggestedText": "This experience taught me resilience.",
 "explanation": "Name the lesson."}
```"#,
    ]);
    let seen = mock.seen.clone();
    let advisor = LlmAdvisor::new(Box::new(mock));

    let mut editor = EssayEditor::new(ESSAY);
    let token = editor.begin_request();
    // The document stays editable while the request is outstanding.
    assert!(editor.on_user_edit(ESSAY).is_some());

    let response = request_suggestions(
        &advisor,
        token,
        &editor.plain_text(),
        "be more specific",
        Duration::from_secs(30),
    )
    .await;
    assert_eq!(editor.receive(response), ReceiveOutcome::Reviewing(1));
    assert_eq!(editor.variant(), ReviewVariant::Single);

    let sent = seen.lock().unwrap();
    assert_eq!(sent[0][0].role, Role::System);
    assert!(sent[0][1].content.contains("Edit request: be more specific"));
    assert!(!sent[0][1].content.contains("<p>"));
    drop(sent);

    editor.keep(0);
    assert_eq!(
        editor.content(),
        "<p>This experience taught me resilience.</p><p>It changed me.</p>"
    );
}

#[tokio::test]
async fn test_feedback_batch_filters_and_reviews() {
    let mock = MockLlm::new(vec![
        r#"{"suggestions": [
            {"originalText": "It changed me.", "suggestedText": "It rewired how I listen.", "explanation": "Show change."},
            {"originalText": "Not in the essay.", "suggestedText": "x", "explanation": "y"},
            {"originalText": "I learned"}
        ]}"#,
    ]);
    let advisor = LlmAdvisor::new(Box::new(mock));
    let feedback = FeedbackContext {
        overall_score: Some(72.0),
        summary: "Generic reflections.".into(),
        improvement_areas: vec!["Specificity".into()],
    };

    let mut editor = EssayEditor::new(ESSAY);
    let token = editor.begin_request();
    let response = request_feedback_edits(
        &advisor,
        token,
        &editor.plain_text(),
        &feedback,
        Duration::from_secs(30),
    )
    .await;
    assert_eq!(editor.receive(response), ReceiveOutcome::Reviewing(1));
    assert_eq!(editor.variant(), ReviewVariant::Single);
    assert_eq!(editor.pending()[0].original_text, "It changed me.");
}

#[tokio::test]
async fn test_unlocatable_batch_reports_no_actionable() {
    let mock = MockLlm::new(vec![
        r#"[{"originalText": "Paraphrased, not verbatim.", "suggestedText": "x", "explanation": "y"}]"#,
    ]);
    let advisor = LlmAdvisor::new(Box::new(mock));
    let mut editor = EssayEditor::new(ESSAY);
    let token = editor.begin_request();
    let response = request_feedback_edits(
        &advisor,
        token,
        &editor.plain_text(),
        &FeedbackContext::default(),
        Duration::from_secs(30),
    )
    .await;
    assert_eq!(editor.receive(response), ReceiveOutcome::NoActionable { dropped: 1 });
    assert_eq!(editor.mode(), ReviewMode::Idle);
    assert_eq!(editor.content(), ESSAY);
}

#[tokio::test]
async fn test_superseded_response_is_ignored() {
    let advisor = LlmAdvisor::new(Box::new(MockLlm::new(vec![
        r#"{"originalText": "It changed me.", "suggestedText": "A", "explanation": "first"}"#,
        r#"{"originalText": "It changed me.", "suggestedText": "B", "explanation": "second"}"#,
    ])));
    let mut editor = EssayEditor::new(ESSAY);

    let first = editor.begin_request();
    let second = editor.begin_request();
    let text = editor.plain_text();
    let late = request_suggestions(&advisor, first, &text, "shorter", Duration::from_secs(30)).await;
    let fresh = request_suggestions(&advisor, second, &text, "shorter", Duration::from_secs(30)).await;

    assert_eq!(editor.receive(fresh), ReceiveOutcome::Reviewing(1));
    assert_eq!(editor.receive(late), ReceiveOutcome::Stale);
    assert_eq!(editor.pending()[0].suggested_text, "B");
}

#[tokio::test]
async fn test_model_failure_is_recoverable() {
    let advisor = LlmAdvisor::new(Box::new(MockLlm::new(vec!["I'm sorry, I can't help with that."])));
    let mut editor = EssayEditor::new(ESSAY);
    let token = editor.begin_request();
    let response =
        request_suggestions(&advisor, token, &editor.plain_text(), "x", Duration::from_secs(30)).await;
    let err = response.result.as_ref().unwrap_err();
    assert!(err.is_recoverable());

    assert!(matches!(editor.receive(response), ReceiveOutcome::Failed(_)));
    assert!(editor.pending().is_empty());
    assert!(!editor.is_busy());
}

#[tokio::test]
async fn test_long_essays_are_truncated_before_sending() {
    let mock = MockLlm::new(vec!["[]"]);
    let seen = mock.seen.clone();
    let advisor = LlmAdvisor::new(Box::new(mock)).with_max_essay_chars(10);
    let essay = "x".repeat(50);
    let suggestions = advisor
        .suggest_edits(&essay, &FeedbackContext::default())
        .await
        .unwrap();
    assert!(suggestions.is_empty());
    let sent = seen.lock().unwrap();
    assert!(sent[0][1].content.ends_with(&"x".repeat(10)));
    assert!(!sent[0][1].content.contains(&"x".repeat(11)));
}
