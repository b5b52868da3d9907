use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::defaults;
use crate::html;

/// A persisted essay. `content` is always plain document HTML, never
/// overlay markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Essay {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub college_target: Option<String>,
    pub essay_type: String,
    #[serde(default)]
    pub word_count: usize,
    #[serde(default)]
    pub max_words: Option<usize>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

impl Essay {
    pub fn new(title: impl Into<String>, essay_type: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            title: title.into(),
            content: String::new(),
            college_target: Some(defaults::COLLEGE_TARGET.to_string()),
            essay_type: essay_type.unwrap_or_else(|| defaults::ESSAY_TYPE.to_string()),
            word_count: 0,
            max_words: None,
            created_at: now,
            last_modified: now,
        }
    }

    /// Replace the content and bump the modification time. The word count
    /// is recomputed from the HTML when the caller does not supply one.
    pub fn update_content(&mut self, content: impl Into<String>, word_count: Option<usize>) {
        self.content = content.into();
        self.word_count = word_count.unwrap_or_else(|| html::word_count(&self.content));
        self.last_modified = Utc::now();
    }

    pub fn summary(&self) -> EssaySummary {
        EssaySummary {
            id: self.id.clone(),
            title: self.title.clone(),
            essay_type: self.essay_type.clone(),
            word_count: self.word_count,
            last_modified: self.last_modified,
        }
    }
}

/// Listing entry for an essay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssaySummary {
    pub id: String,
    pub title: String,
    pub essay_type: String,
    pub word_count: usize,
    pub last_modified: DateTime<Utc>,
}

pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
