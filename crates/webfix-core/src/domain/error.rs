//! Error taxonomy for the correction pipeline.

use std::path::PathBuf;

/// A request field was missing, blank, or malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
}

/// Errors produced at the critique/generation service boundary.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("http error: {0}")]
    Http(String),

    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid service response: {0}")]
    InvalidResponse(String),

    #[error("service misconfigured: {0}")]
    Configuration(String),
}

/// Errors leaving the correction pipeline.
///
/// Every variant carrying external text (stderr, command lines) holds it
/// already redacted.
#[derive(Debug, thiserror::Error)]
pub enum WebfixError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to create workspace {path}: {source}")]
    WorkspaceCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("git clone failed (exit code {exit_code}): {stderr}")]
    Clone { exit_code: i32, stderr: String },

    #[error("failed to read artifact {path}: {source}")]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write artifact {path}: {source}")]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("critique service failed: {0}")]
    CritiqueService(#[source] ServiceError),

    #[error("generation service failed: {0}")]
    GenerationService(#[source] ServiceError),

    #[error("git command failed: {command} (exit code {exit_code}): {stderr}")]
    GitCommand {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("failed to remove workspace {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pipeline error: {0}")]
    Pipeline(String),
}

impl WebfixError {
    /// Short, stable name of the error kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            WebfixError::Validation(_) => "validation",
            WebfixError::WorkspaceCreation { .. } => "workspace_creation",
            WebfixError::Clone { .. } => "clone",
            WebfixError::ArtifactRead { .. } => "artifact_read",
            WebfixError::ArtifactWrite { .. } => "artifact_write",
            WebfixError::CritiqueService(_) => "critique_service",
            WebfixError::GenerationService(_) => "generation_service",
            WebfixError::GitCommand { .. } => "git_command",
            WebfixError::Cleanup { .. } => "cleanup",
            WebfixError::Pipeline(_) => "pipeline",
        }
    }

    /// Build a catch-all error from a panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        WebfixError::Pipeline(format!("stage panicked: {message}"))
    }
}

/// Result type for webfix operations.
pub type Result<T> = std::result::Result<T, WebfixError>;
