mod traits;
mod claude;
mod openai;

pub use traits::*;
pub use claude::ClaudeClient;
pub use openai::OpenAIClient;
