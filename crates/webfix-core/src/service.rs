//! Boundaries to the external critique and generation services.

use async_trait::async_trait;

use crate::domain::{ConversationContext, CritiqueResult, ModelTier, ServiceError};

/// Assesses content and reports categorized findings with a score.
#[async_trait]
pub trait CritiqueService: Send + Sync {
    async fn critique(
        &self,
        context: &ConversationContext,
        content: &str,
    ) -> Result<CritiqueResult, ServiceError>;
}

/// Produces corrected content from a prompt.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn generate(&self, prompt: &str, tier: ModelTier) -> Result<String, ServiceError>;
}
