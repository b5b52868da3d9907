use thiserror::Error;

#[derive(Error, Debug)]
pub enum EssayError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Advisory error: {0}")]
    Advisory(String),

    #[error("Advisory request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("No actionable suggestions ({dropped} could not be located in the essay)")]
    NoActionableSuggestions { dropped: usize },

    #[error("Essay not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl EssayError {
    pub fn advisory(message: impl Into<String>) -> Self {
        Self::Advisory(message.into())
    }

    /// Errors the user can recover from by retrying the same action.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Llm(_) | Self::Advisory(_) | Self::Timeout { .. } | Self::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, EssayError>;
