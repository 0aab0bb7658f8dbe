//! Generation service backed by a chat completion.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use webfix_core::{GenerationService, ModelTier, ServiceError};

use crate::client::LlmClient;
use crate::parse::parse_generated;

const GENERATION_SYSTEM_PROMPT: &str = "You are an expert web developer. \
Apply the requested corrections and return the complete corrected HTML document only, \
without commentary.";

/// [`GenerationService`] returning the model's rewritten document.
#[derive(Debug, Clone)]
pub struct LlmGenerator {
    client: Arc<LlmClient>,
}

impl LlmGenerator {
    pub fn new(client: Arc<LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GenerationService for LlmGenerator {
    async fn generate(&self, prompt: &str, tier: ModelTier) -> Result<String, ServiceError> {
        let model = self.client.config().model_for(tier);
        debug!(model = %model, tier = tier.name(), prompt_chars = prompt.len(), "Requesting generation");

        let response = self
            .client
            .complete(model, GENERATION_SYSTEM_PROMPT, prompt)
            .await?;
        Ok(parse_generated(&response))
    }
}
