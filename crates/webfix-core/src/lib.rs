//! Webfix Core Library
//!
//! Clone a repository into a private workspace, correct one HTML artifact
//! with a critique service and a generation service, publish the result, and
//! always clean up.

pub mod config;
pub mod diff;
pub mod domain;
pub mod fakes;
pub mod git;
pub mod obs;
pub mod pipeline;
pub mod prompt;
pub mod redact;
pub mod report;
pub mod service;
pub mod telemetry;
pub mod workspace;

pub use config::PipelineConfig;
pub use diff::{diff_lines, DiffReport, DiffSegment, SegmentKind};
pub use domain::{
    ConversationContext, CorrectionRequest, Credential, CritiqueResult, Finding, ModelTier,
    Result, ServiceError, ValidationError, WebfixError,
};
pub use git::{credentialed_url, GitCliClient, Identity, RemoteSyncClient};
pub use obs::{PipelineEvent, PipelineObserver, TracingObserver};
pub use pipeline::{CorrectionPipeline, PipelineState, Stage};
pub use prompt::build_generation_prompt;
pub use redact::Redactor;
pub use report::{ChangeSummary, PipelineResult};
pub use service::{CritiqueService, GenerationService};
pub use workspace::{Workspace, WorkspaceManager};
