use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::advisory::LlmAdvisor;
use crate::constants::{advisory, defaults, endpoints, models, paths};
use crate::error::EssayError;
use crate::llm::{ClaudeClient, LlmClient, OpenAIClient};
use crate::storage::FileEssayStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub advisory: AdvisorySettings,
    #[serde(default)]
    pub editor: EditorSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub model: String,
    pub api_key_env: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Claude,
    OpenAI,
}

impl LlmProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::Claude => models::DEFAULT_CLAUDE_MODEL,
            LlmProvider::OpenAI => models::DEFAULT_OPENAI_MODEL,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            LlmProvider::Claude => endpoints::CLAUDE_BASE_URL,
            LlmProvider::OpenAI => endpoints::OPENAI_BASE_URL,
        }
    }

    pub fn default_api_key_env(self) -> &'static str {
        match self {
            LlmProvider::Claude => defaults::CLAUDE_API_KEY_ENV,
            LlmProvider::OpenAI => defaults::OPENAI_API_KEY_ENV,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorySettings {
    pub timeout_secs: u64,
    pub max_essay_chars: usize,
    pub min_suggestions: usize,
    pub max_suggestions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSettings {
    pub max_words: Option<usize>,
    pub placeholder: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Overrides the platform data directory for essay files.
    pub data_dir: Option<PathBuf>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        let provider = LlmProvider::OpenAI;
        Self {
            provider,
            model: provider.default_model().to_string(),
            api_key_env: provider.default_api_key_env().to_string(),
            base_url: None,
            max_tokens: defaults::MAX_TOKENS,
            temperature: defaults::TEMPERATURE,
        }
    }
}

impl Default for AdvisorySettings {
    fn default() -> Self {
        Self {
            timeout_secs: advisory::TIMEOUT_SECS,
            max_essay_chars: advisory::MAX_ESSAY_CHARS,
            min_suggestions: advisory::MIN_SUGGESTIONS,
            max_suggestions: advisory::MAX_SUGGESTIONS,
        }
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            max_words: None,
            placeholder: defaults::PLACEHOLDER.to_string(),
        }
    }
}

impl AdvisorySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(paths::CONFIG_DIR)
            .join(paths::CONFIG_FILE)
    }

    /// Settings from the user config file, or defaults when it is missing
    /// or unreadable.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(settings) => return settings,
                Err(e) => tracing::warn!("ignoring config {}: {}", config_path.display(), e),
            }
        }
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self, EssayError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| EssayError::Config(e.to_string()))
    }

    pub fn save(&self) -> Result<(), EssayError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), EssayError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| EssayError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the API key from the environment variable specified in settings.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    /// Build an LLM client from the current settings.
    pub fn build_llm_client(&self) -> Result<Box<dyn LlmClient>, EssayError> {
        let api_key = self.api_key().ok_or_else(|| {
            EssayError::Config(format!(
                "API key not set: export {} to use the {:?} provider",
                self.llm.api_key_env, self.llm.provider
            ))
        })?;
        let base_url = self
            .llm
            .base_url
            .clone()
            .unwrap_or_else(|| self.llm.provider.default_base_url().to_string());

        let client: Box<dyn LlmClient> = match self.llm.provider {
            LlmProvider::OpenAI => Box::new(
                OpenAIClient::new(api_key)
                    .with_model(&self.llm.model)
                    .with_base_url(base_url)
                    .with_max_tokens(self.llm.max_tokens)
                    .with_temperature(self.llm.temperature),
            ),
            LlmProvider::Claude => Box::new(
                ClaudeClient::new(api_key)
                    .with_model(&self.llm.model)
                    .with_base_url(base_url)
                    .with_max_tokens(self.llm.max_tokens)
                    .with_temperature(self.llm.temperature),
            ),
        };
        Ok(client)
    }

    /// Build the LLM-backed advisor with the configured limits.
    pub fn build_advisor(&self) -> Result<LlmAdvisor, EssayError> {
        Ok(LlmAdvisor::new(self.build_llm_client()?)
            .with_max_essay_chars(self.advisory.max_essay_chars)
            .with_suggestion_range(self.advisory.min_suggestions, self.advisory.max_suggestions))
    }

    pub fn build_store(&self) -> Result<FileEssayStore, EssayError> {
        match &self.storage.data_dir {
            Some(dir) => FileEssayStore::with_dir(dir),
            None => FileEssayStore::new(),
        }
    }
}
