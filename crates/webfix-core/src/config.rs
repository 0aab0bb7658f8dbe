//! Pipeline configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::ModelTier;

pub const DEFAULT_COMMIT_MESSAGE: &str = "Applied HTML corrections";
pub const DEFAULT_EMAIL_DOMAIN: &str = "users.noreply.github.com";

/// Settings shared by every pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory under which workspaces are created.
    pub workspace_root: PathBuf,
    pub commit_message: String,
    /// Branch to push; `None` pushes the cloned branch.
    pub push_branch: Option<String>,
    /// Commit email is `<username>@<email_domain>`.
    pub email_domain: String,
    pub model_tier: ModelTier,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workspace_root: std::env::temp_dir().join("webfix"),
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
            push_branch: None,
            email_domain: DEFAULT_EMAIL_DOMAIN.to_string(),
            model_tier: ModelTier::default(),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by `WEBFIX_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(root) = env_nonempty("WEBFIX_WORKSPACE_ROOT") {
            config.workspace_root = PathBuf::from(root);
        }
        if let Some(message) = env_nonempty("WEBFIX_COMMIT_MESSAGE") {
            config.commit_message = message;
        }
        if let Some(branch) = env_nonempty("WEBFIX_PUSH_BRANCH") {
            config.push_branch = Some(branch);
        }
        if let Some(domain) = env_nonempty("WEBFIX_EMAIL_DOMAIN") {
            config.email_domain = domain;
        }
        if let Some(tier) = env_nonempty("WEBFIX_MODEL_TIER").and_then(|t| t.parse().ok()) {
            config.model_tier = tier;
        }
        config
    }

    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
