use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{EditAdvisor, EditSuggestion, FeedbackContext};
use crate::constants::advisory::{MAX_ESSAY_CHARS, MAX_SUGGESTIONS, MIN_SUGGESTIONS};
use crate::error::{EssayError, Result};
use crate::llm::{ChatOptions, LlmClient, Message};

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").expect("static fence pattern");
    static ref JSON_ARRAY: Regex = Regex::new(r"(?s)\[.*\]").expect("static array pattern");
    static ref JSON_OBJECT: Regex = Regex::new(r"(?s)\{.*\}").expect("static object pattern");
}

const SINGLE_EDIT_PROMPT: &str = "You are an expert college essay editor. The user will provide an essay and a specific edit request.

Find a specific section of the essay that matches the user's request and suggest an improved version.

Respond with JSON in this exact format:
{
  \"originalText\": \"exact text from the essay to be replaced\",
  \"suggestedText\": \"your improved version\",
  \"explanation\": \"brief explanation of why this change improves the essay\"
}

Guidelines:
- originalText must be copied verbatim from the essay, character for character
- Keep the original meaning and voice intact
- Make suggestions that improve clarity, impact, or flow
- Choose sections that are 1-3 sentences long for manageable edits
- Only suggest changes that directly address the user's request";

/// [`EditAdvisor`] backed by any chat-completion [`LlmClient`].
pub struct LlmAdvisor {
    client: Box<dyn LlmClient>,
    max_essay_chars: usize,
    min_suggestions: usize,
    max_suggestions: usize,
}

impl LlmAdvisor {
    pub fn new(client: Box<dyn LlmClient>) -> Self {
        Self {
            client,
            max_essay_chars: MAX_ESSAY_CHARS,
            min_suggestions: MIN_SUGGESTIONS,
            max_suggestions: MAX_SUGGESTIONS,
        }
    }

    pub fn with_max_essay_chars(mut self, max: usize) -> Self {
        self.max_essay_chars = max;
        self
    }

    pub fn with_suggestion_range(mut self, min: usize, max: usize) -> Self {
        self.min_suggestions = min.min(max);
        self.max_suggestions = max.max(min);
        self
    }

    fn batch_prompt(&self) -> String {
        format!(
            "You are an expert college essay editor. Based on the feedback provided, \
             generate {}-{} specific, targeted edit suggestions for the essay.

Respond with a JSON object of the form:
{{
  \"suggestions\": [
    {{
      \"originalText\": \"exact text from the essay to be replaced\",
      \"suggestedText\": \"your improved version\",
      \"explanation\": \"which improvement area this addresses and why\"
    }}
  ]
}}

Guidelines:
- originalText must be copied verbatim from the essay and must not overlap another suggestion
- Each suggestion should cover 1-3 sentences
- Keep the student's voice; do not invent experiences",
            self.min_suggestions, self.max_suggestions
        )
    }

    async fn complete(&self, system: String, user: String) -> Result<String> {
        let messages = [Message::system(system), Message::user(user)];
        let response = self.client.chat(&messages, &ChatOptions::json()).await?;
        if let Some(usage) = &response.usage {
            debug!(
                model = self.client.model(),
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "advisory completion"
            );
        }
        let content = response.message.content;
        if content.trim().is_empty() {
            return Err(EssayError::advisory("Empty response from model"));
        }
        Ok(content)
    }
}

#[async_trait::async_trait]
impl EditAdvisor for LlmAdvisor {
    async fn suggest_edit(&self, essay_text: &str, user_request: &str) -> Result<EditSuggestion> {
        let essay = truncate_chars(essay_text, self.max_essay_chars);
        let user = format!("Essay content:\n{essay}\n\nEdit request: {user_request}");
        let raw = self.complete(SINGLE_EDIT_PROMPT.to_string(), user).await?;
        parse_single(&raw)
    }

    async fn suggest_edits(
        &self,
        essay_text: &str,
        feedback: &FeedbackContext,
    ) -> Result<Vec<EditSuggestion>> {
        let essay = truncate_chars(essay_text, self.max_essay_chars);
        let user = feedback_prompt(feedback, essay);
        let raw = self.complete(self.batch_prompt(), user).await?;
        let mut suggestions = parse_many(&raw);
        suggestions.truncate(self.max_suggestions);
        info!("advisor returned {} edit suggestions", suggestions.len());
        Ok(suggestions)
    }
}

fn feedback_prompt(feedback: &FeedbackContext, essay: &str) -> String {
    let score = feedback
        .overall_score
        .map_or_else(|| "n/a".to_string(), |s| format!("{s}"));
    let summary = if feedback.summary.trim().is_empty() {
        "No summary available"
    } else {
        feedback.summary.trim()
    };
    let areas: String = feedback
        .improvement_areas
        .iter()
        .enumerate()
        .map(|(i, area)| format!("{}. {}\n", i + 1, area))
        .collect();

    format!(
        "Based on this essay feedback:\n\nOverall Score: {score}\nSummary: {summary}\n\n\
         Improvement Areas:\n{areas}\nEssay content:\n{}",
        essay.trim()
    )
}

/// The first `max` characters of `text`, cut on a char boundary.
pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

fn strip_code_fence(raw: &str) -> &str {
    CODE_FENCE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map_or(raw.trim(), |m| m.as_str())
}

/// Parse a single-suggestion response: a JSON object, possibly fenced or
/// surrounded by prose.
pub(crate) fn parse_single(raw: &str) -> Result<EditSuggestion> {
    let body = strip_code_fence(raw);
    let suggestion: EditSuggestion = match serde_json::from_str(body) {
        Ok(s) => s,
        Err(first_err) => {
            let object = JSON_OBJECT
                .find(body)
                .ok_or_else(|| EssayError::advisory(format!("Unparseable suggestion: {first_err}")))?;
            serde_json::from_str(object.as_str())?
        }
    };

    if suggestion.original_text.trim().is_empty() {
        return Err(EssayError::advisory(
            "Model did not identify any essay text to replace",
        ));
    }
    Ok(suggestion)
}

/// Parse a batch response. Accepts a bare array, `{"suggestions": [...]}`,
/// a single object, or an array embedded in prose. Incomplete entries are
/// dropped; an unusable response yields an empty list.
pub(crate) fn parse_many(raw: &str) -> Vec<EditSuggestion> {
    let body = strip_code_fence(raw);
    let value = serde_json::from_str::<Value>(body).ok().or_else(|| {
        JSON_ARRAY
            .find(body)
            .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
    });

    let items = match value {
        Some(Value::Array(items)) => items,
        Some(Value::Object(mut map)) => match map.remove("suggestions") {
            Some(Value::Array(items)) => items,
            _ => vec![Value::Object(map)],
        },
        _ => {
            warn!("no valid suggestions found in advisory response");
            return Vec::new();
        }
    };

    let total = items.len();
    let suggestions: Vec<EditSuggestion> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<EditSuggestion>(item).ok())
        .filter(EditSuggestion::is_complete)
        .collect();
    if suggestions.len() < total {
        debug!("discarded {} incomplete suggestions", total - suggestions.len());
    }
    suggestions
}
