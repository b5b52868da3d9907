//! Essay persistence.

mod essay;
mod file;
mod memory;

pub use essay::{generate_id, Essay, EssaySummary};
pub use file::FileEssayStore;
pub use memory::MemoryEssayStore;

use crate::error::Result;

/// Where essays live. Saving is explicit; the editor never writes on its
/// own.
#[async_trait::async_trait]
pub trait EssayStore: Send + Sync {
    async fn load_essay(&self, id: &str) -> Result<Essay>;

    /// Overwrite the content of an existing essay and return it updated.
    async fn save_essay(&self, id: &str, content: &str, word_count: usize) -> Result<Essay>;

    async fn create_essay(&self, title: &str, essay_type: Option<String>) -> Result<Essay>;

    /// Every essay, most recently modified first.
    async fn list_essays(&self) -> Result<Vec<EssaySummary>>;

    async fn delete_essay(&self, id: &str) -> Result<()>;
}
