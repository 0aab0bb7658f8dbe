//! Critique service backed by a chat completion.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use webfix_core::{
    ConversationContext, CritiqueResult, CritiqueService, ModelTier, ServiceError,
};

use crate::client::LlmClient;
use crate::parse::parse_critique;

const CRITIQUE_SYSTEM_PROMPT: &str = "You review HTML documents. \
List concrete problems with markup validity, accessibility, semantics and content. \
Respond with a single JSON object and nothing else: \
{\"fixes\": [{\"description\": string, \"category\": string}], \"score\": number from 0 to 10}.";

/// [`CritiqueService`] asking a chat model for structured findings.
#[derive(Debug, Clone)]
pub struct LlmCritic {
    client: Arc<LlmClient>,
    tier: ModelTier,
}

impl LlmCritic {
    pub fn new(client: Arc<LlmClient>) -> Self {
        Self {
            client,
            tier: ModelTier::Medium,
        }
    }

    pub fn with_tier(mut self, tier: ModelTier) -> Self {
        self.tier = tier;
        self
    }
}

#[async_trait]
impl CritiqueService for LlmCritic {
    async fn critique(
        &self,
        context: &ConversationContext,
        content: &str,
    ) -> Result<CritiqueResult, ServiceError> {
        let model = self.client.config().model_for(self.tier);
        debug!(agent_id = %context.agent_id, model = %model, "Requesting critique");

        let response = self
            .client
            .complete(model, CRITIQUE_SYSTEM_PROMPT, content)
            .await?;
        parse_critique(&response)
    }
}
