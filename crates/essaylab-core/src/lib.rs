pub mod error;
pub mod constants;
pub mod html;
pub mod surface;
pub mod matcher;
pub mod renderer;
pub mod lifecycle;
pub mod advisory;
pub mod llm;
pub mod storage;
pub mod config;

// Re-export key types
pub use error::EssayError;
pub use advisory::{EditAdvisor, EditSuggestion, FeedbackContext, LlmAdvisor, RequestToken};
pub use lifecycle::{EditorAction, EditorEvent, EssayEditor, ReceiveOutcome, Resolution, ReviewMode};
pub use renderer::{render_annotated, AnnotatedView, ControlAction, ReviewVariant};
pub use surface::{ClipboardPayload, ContentChange, FormatCommand, RichTextSurface};
pub use llm::{LlmClient, LlmResponse, Message, Role};
pub use storage::{Essay, EssayStore, FileEssayStore, MemoryEssayStore};
pub use config::Settings;
