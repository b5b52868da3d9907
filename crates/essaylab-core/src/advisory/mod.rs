//! The advisory (LLM) collaborator: what it returns and how the editor
//! talks to it.

mod llm;
mod request;

pub use llm::LlmAdvisor;
pub(crate) use llm::truncate_chars;
pub use request::{
    request_feedback_edits, request_suggestions, with_timeout, AdvisoryResponse, RequestToken,
    RequestTracker,
};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A proposed replacement of a verbatim essay passage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSuggestion {
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub suggested_text: String,
    #[serde(default)]
    pub explanation: String,
}

impl EditSuggestion {
    pub fn new(
        original_text: impl Into<String>,
        suggested_text: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            original_text: original_text.into(),
            suggested_text: suggested_text.into(),
            explanation: explanation.into(),
        }
    }

    /// All three fields present. Incomplete entries from the model are
    /// discarded before they reach the editor.
    pub fn is_complete(&self) -> bool {
        !self.original_text.trim().is_empty()
            && !self.suggested_text.trim().is_empty()
            && !self.explanation.trim().is_empty()
    }
}

/// Essay feedback that seeds a batch of suggestions. Produced by the
/// feedback service; only consumed here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackContext {
    #[serde(default)]
    pub overall_score: Option<f32>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub improvement_areas: Vec<String>,
}

/// The advisory service as the editor sees it.
#[async_trait::async_trait]
pub trait EditAdvisor: Send + Sync {
    /// One targeted edit answering a free-form request ("make the opening
    /// punchier").
    async fn suggest_edit(&self, essay_text: &str, user_request: &str) -> Result<EditSuggestion>;

    /// Several edits addressing the improvement areas in `feedback`.
    async fn suggest_edits(
        &self,
        essay_text: &str,
        feedback: &FeedbackContext,
    ) -> Result<Vec<EditSuggestion>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_suggestion_wire_format_is_camel_case() {
        let s = EditSuggestion::new("a", "b", "c");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["originalText"], "a");
        assert_eq!(json["suggestedText"], "b");
        assert_eq!(json["explanation"], "c");
    }

    #[test]
    fn test_incomplete_suggestions() {
        let partial: EditSuggestion =
            serde_json::from_str(r#"{"originalText": "a", "suggestedText": "b"}"#).unwrap();
        assert!(!partial.is_complete());
        assert!(EditSuggestion::new("a", "b", "c").is_complete());
    }
}
