//! Chat-completion endpoint configuration.

use serde::{Deserialize, Serialize};
use webfix_core::ModelTier;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Endpoint, credentials and per-tier model names.
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API root; requests go to `<base_url>/chat/completions`.
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model_small: String,
    pub model_medium: String,
    pub model_large: String,
    pub user_agent: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model_small: "gpt-4o-mini".to_string(),
            model_medium: "gpt-4o".to_string(),
            model_large: "gpt-4.1".to_string(),
            user_agent: format!("webfix/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl LlmConfig {
    /// Defaults overridden by `WEBFIX_LLM_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(url) = env_nonempty("WEBFIX_LLM_BASE_URL") {
            config.base_url = url;
        }
        config.api_key = env_nonempty("WEBFIX_LLM_API_KEY");
        if let Some(model) = env_nonempty("WEBFIX_LLM_MODEL_SMALL") {
            config.model_small = model;
        }
        if let Some(model) = env_nonempty("WEBFIX_LLM_MODEL_MEDIUM") {
            config.model_medium = model;
        }
        if let Some(model) = env_nonempty("WEBFIX_LLM_MODEL_LARGE") {
            config.model_large = model;
        }
        config
    }

    pub fn new(base_url: &str) -> Self {
        LlmConfig {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_string());
        self
    }

    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Small => &self.model_small,
            ModelTier::Medium => &self.model_medium,
            ModelTier::Large => &self.model_large,
        }
    }

    pub(crate) fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("model_small", &self.model_small)
            .field("model_medium", &self.model_medium)
            .field("model_large", &self.model_large)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
