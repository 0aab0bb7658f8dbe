//! Values exchanged with the critique and generation services.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One issue reported by the critique service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub description: String,
    pub category: String,
}

impl Finding {
    pub fn new(description: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            category: category.into(),
        }
    }
}

/// Critique of one artifact. Findings keep the order the service returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CritiqueResult {
    #[serde(alias = "fixes")]
    pub findings: Vec<Finding>,
    pub score: f64,
}

/// Conversational context handed to the critique service with the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub agent_id: Uuid,
    pub room_id: Uuid,
    pub text: String,
}

impl ConversationContext {
    /// Context for a single, roomless exchange about `text`.
    pub fn for_content(agent_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            agent_id,
            room_id: Uuid::nil(),
            text: text.into(),
        }
    }
}

/// Model-tier selector passed to the generation service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    Small,
    #[default]
    Medium,
    Large,
}

impl ModelTier {
    pub fn name(&self) -> &'static str {
        match self {
            ModelTier::Small => "small",
            ModelTier::Medium => "medium",
            ModelTier::Large => "large",
        }
    }
}

impl std::str::FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(ModelTier::Small),
            "medium" => Ok(ModelTier::Medium),
            "large" => Ok(ModelTier::Large),
            other => Err(format!("unknown model tier: {other}")),
        }
    }
}
