use std::collections::HashMap;
use std::sync::Mutex;

use super::{Essay, EssayStore, EssaySummary};
use crate::error::{EssayError, Result};

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryEssayStore {
    essays: Mutex<HashMap<String, Essay>>,
}

impl MemoryEssayStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Essay>>> {
        self.essays
            .lock()
            .map_err(|_| EssayError::Other("essay store lock poisoned".to_string()))
    }

    /// Insert or replace an essay as-is.
    pub fn insert(&self, essay: Essay) -> Result<()> {
        self.lock()?.insert(essay.id.clone(), essay);
        Ok(())
    }
}

#[async_trait::async_trait]
impl EssayStore for MemoryEssayStore {
    async fn load_essay(&self, id: &str) -> Result<Essay> {
        self.lock()?
            .get(id)
            .cloned()
            .ok_or_else(|| EssayError::NotFound(id.to_string()))
    }

    async fn save_essay(&self, id: &str, content: &str, word_count: usize) -> Result<Essay> {
        let mut essays = self.lock()?;
        let essay = essays
            .get_mut(id)
            .ok_or_else(|| EssayError::NotFound(id.to_string()))?;
        essay.update_content(content, Some(word_count));
        Ok(essay.clone())
    }

    async fn create_essay(&self, title: &str, essay_type: Option<String>) -> Result<Essay> {
        let essay = Essay::new(title, essay_type);
        self.insert(essay.clone())?;
        Ok(essay)
    }

    async fn list_essays(&self) -> Result<Vec<EssaySummary>> {
        let mut summaries: Vec<EssaySummary> = self.lock()?.values().map(Essay::summary).collect();
        summaries.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(summaries)
    }

    async fn delete_essay(&self, id: &str) -> Result<()> {
        self.lock()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| EssayError::NotFound(id.to_string()))
    }
}
