use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info, warn};

use super::{Essay, EssayStore, EssaySummary};
use crate::constants::paths;
use crate::error::{EssayError, Result};

/// One pretty-printed JSON file per essay, `<dir>/<id>.json`.
pub struct FileEssayStore {
    base_dir: PathBuf,
}

impl FileEssayStore {
    /// Store under the platform data directory
    /// (`~/.local/share/essaylab/essays` on Linux).
    pub fn new() -> Result<Self> {
        Self::with_dir(Self::default_dir()?)
    }

    /// Store under a custom directory (useful for testing).
    pub fn with_dir(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir).map_err(|e| {
            EssayError::Config(format!(
                "Failed to create essays directory {}: {}",
                base_dir.display(),
                e
            ))
        })?;
        Ok(Self { base_dir })
    }

    pub fn default_dir() -> Result<PathBuf> {
        let data = dirs::data_dir().ok_or_else(|| {
            EssayError::Config("Could not determine data directory".to_string())
        })?;
        Ok(data.join(paths::CONFIG_DIR).join(paths::ESSAYS_DIR))
    }

    pub fn dir(&self) -> &Path {
        &self.base_dir
    }

    fn essay_path(&self, id: &str) -> Result<PathBuf> {
        // Ids become file names; refuse anything that could escape the dir.
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(EssayError::NotFound(id.to_string()));
        }
        Ok(self.base_dir.join(format!("{id}.json")))
    }

    async fn write(&self, essay: &Essay) -> Result<()> {
        let path = self.essay_path(&essay.id)?;
        let contents = serde_json::to_string_pretty(essay)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, contents).await?;
        fs::rename(&tmp_path, &path).await?;
        debug!(id = %essay.id, "essay written to {}", path.display());
        Ok(())
    }
}

#[async_trait::async_trait]
impl EssayStore for FileEssayStore {
    async fn load_essay(&self, id: &str) -> Result<Essay> {
        let path = self.essay_path(id)?;
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(EssayError::NotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&contents)?)
    }

    async fn save_essay(&self, id: &str, content: &str, word_count: usize) -> Result<Essay> {
        let mut essay = self.load_essay(id).await?;
        essay.update_content(content, Some(word_count));
        self.write(&essay).await?;
        info!(id, word_count, "essay saved");
        Ok(essay)
    }

    async fn create_essay(&self, title: &str, essay_type: Option<String>) -> Result<Essay> {
        let essay = Essay::new(title, essay_type);
        self.write(&essay).await?;
        info!(id = %essay.id, "essay created");
        Ok(essay)
    }

    async fn list_essays(&self) -> Result<Vec<EssaySummary>> {
        let mut summaries = Vec::new();
        let mut entries = fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .await
                .map_err(EssayError::from)
                .and_then(|c| serde_json::from_str::<Essay>(&c).map_err(EssayError::from));
            match parsed {
                Ok(essay) => summaries.push(essay.summary()),
                Err(e) => warn!("skipping unreadable essay file {}: {}", path.display(), e),
            }
        }
        summaries.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        Ok(summaries)
    }

    async fn delete_essay(&self, id: &str) -> Result<()> {
        let path = self.essay_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(EssayError::NotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}
