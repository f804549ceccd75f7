use log::{debug, info};
use std::fmt;

use crate::ai::{Backend, PromptBuilder, Resolution, ResponseParser};
use crate::config::Credential;
use crate::error::{BackendError, QueryError};
use crate::utils::PlatformContext;

/// Non-empty user request. A refinement builds a new `Query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    pub fn new(text: impl AsRef<str>) -> Result<Self, QueryError> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return Err(QueryError::Empty);
        }
        Ok(Self(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct CommandGenerator<B> {
    backend: B,
    prompts: PromptBuilder,
    parser: ResponseParser,
}

impl<B: Backend> CommandGenerator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            prompts: PromptBuilder::new(),
            parser: ResponseParser::new(),
        }
    }

    /// One backend call, never retried; failures surface as-is.
    pub async fn generate(
        &self,
        query: &Query,
        context: &PlatformContext,
        credential: &Credential,
    ) -> Result<Resolution, BackendError> {
        debug!("Generating command for query: {query}");

        let prompt = self.prompts.build(query, context);
        let raw = self.backend.send(&prompt, credential).await?;
        debug!("Backend returned {} bytes", raw.len());

        let resolution = self.parser.parse(&raw);
        if resolution.has_command() {
            info!("Generated command: {}", resolution.command());
        } else {
            info!("Model returned no command");
        }
        Ok(resolution)
    }
}
