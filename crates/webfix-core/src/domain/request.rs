//! The caller-supplied correction request.

use std::fmt;
use std::path::{Component, Path};

use serde::Serialize;

use super::error::ValidationError;

/// An access token for the remote repository.
///
/// `Debug` and `Display` never print the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token. Only the credentialed clone URL and the redactor use this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// A request to correct one artifact in one repository.
///
/// All fields are required; [`CorrectionRequest::validate`] runs before the
/// pipeline performs any side effect.
#[derive(Debug, Clone, Serialize)]
pub struct CorrectionRequest {
    /// HTTPS URL of the repository.
    pub repo_url: String,
    /// Artifact path relative to the repository root.
    pub file_path: String,
    #[serde(skip)]
    pub credential: Credential,
    /// Account used both to authenticate and to attribute the commit.
    pub username: String,
    /// Free-text description of the wanted corrections.
    pub corrections: String,
}

impl CorrectionRequest {
    pub fn new(
        repo_url: impl Into<String>,
        file_path: impl Into<String>,
        credential: Credential,
        username: impl Into<String>,
        corrections: impl Into<String>,
    ) -> Self {
        Self {
            repo_url: repo_url.into(),
            file_path: file_path.into(),
            credential,
            username: username.into(),
            corrections: corrections.into(),
        }
    }

    /// Reject blank fields, reporting the first one in declaration order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing = |field: &'static str| ValidationError::MissingField { field };

        if self.repo_url.trim().is_empty() {
            return Err(missing("repo_url"));
        }
        if self.file_path.trim().is_empty() {
            return Err(missing("file_path"));
        }
        if !is_contained_relative(&self.file_path) {
            return Err(ValidationError::InvalidField {
                field: "file_path",
                reason: "must be a relative path inside the repository",
            });
        }
        if self.credential.is_blank() {
            return Err(missing("credential"));
        }
        if self.username.trim().is_empty() {
            return Err(missing("username"));
        }
        if self.corrections.trim().is_empty() {
            return Err(missing("corrections"));
        }
        Ok(())
    }
}

/// True when `path` is relative and never climbs out of its base directory.
fn is_contained_relative(path: &str) -> bool {
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
