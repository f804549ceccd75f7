pub mod gemini_client;
pub mod generator;
pub mod prompt;
pub mod response;

use async_trait::async_trait;

use crate::config::Credential;
use crate::error::BackendError;

pub use gemini_client::GeminiClient;
pub use generator::{CommandGenerator, Query};
pub use prompt::PromptBuilder;
pub use response::{Extraction, ExtractionStrategy, Resolution, ResponseParser};

/// The remote model: prompt in, raw reply text out.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn send(&self, prompt: &str, credential: &Credential) -> Result<String, BackendError>;
}
