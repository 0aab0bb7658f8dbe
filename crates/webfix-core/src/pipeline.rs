//! Correction pipeline orchestration.
//!
//! One invocation walks an explicit state machine:
//!
//! ```text
//! Idle -> WorkspaceAcquired -> Cloned -> Analyzed -> Regenerated -> Written -> Pushed -> Released
//! ```
//!
//! Any state may fail; the workspace is then released and the pipeline still
//! ends in `Released`, carrying the originating error. Stages run strictly in
//! order and nothing is retried.

use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::diff::{diff_lines, DiffReport};
use crate::domain::{
    ConversationContext, CorrectionRequest, ModelTier, Result, WebfixError,
};
use crate::git::{Identity, RemoteSyncClient};
use crate::obs::{run_span, PipelineEvent, PipelineObserver, TracingObserver};
use crate::prompt::build_generation_prompt;
use crate::redact::Redactor;
use crate::report::{ChangeSummary, PipelineResult};
use crate::service::{CritiqueService, GenerationService};
use crate::workspace::{Workspace, WorkspaceManager};

/// Run id reported for failures that happen before a workspace exists.
const UNASSIGNED_RUN: &str = "unassigned";

/// Pipeline-level state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    WorkspaceAcquired,
    Cloned,
    Analyzed,
    Regenerated,
    Written,
    Pushed,
    Released,
}

impl PipelineState {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::WorkspaceAcquired => "workspace_acquired",
            PipelineState::Cloned => "cloned",
            PipelineState::Analyzed => "analyzed",
            PipelineState::Regenerated => "regenerated",
            PipelineState::Written => "written",
            PipelineState::Pushed => "pushed",
            PipelineState::Released => "released",
        }
    }
}

/// Stage whose start is recorded in the operation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Clone,
    Critique,
    Generation,
    Write,
    Push,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Clone => "clone",
            Stage::Critique => "critique",
            Stage::Generation => "generation",
            Stage::Write => "write",
            Stage::Push => "push",
        }
    }
}

/// Tracks the current state of one invocation and forwards events.
pub struct StateTracker {
    run_id: String,
    state: PipelineState,
    observer: Arc<dyn PipelineObserver>,
}

impl StateTracker {
    pub fn new(run_id: impl Into<String>, observer: Arc<dyn PipelineObserver>) -> Self {
        Self {
            run_id: run_id.into(),
            state: PipelineState::Idle,
            observer,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn enter(&mut self, state: PipelineState) {
        self.state = state;
        self.record(PipelineEvent::StateEntered(state));
    }

    pub fn stage(&self, stage: Stage) {
        self.record(PipelineEvent::StageStarted(stage));
    }

    pub fn record(&self, event: PipelineEvent) {
        self.observer.record(&self.run_id, &event);
    }
}

/// Read, critique, regenerate, diff, and overwrite one artifact.
///
/// Moves the tracker from `Cloned` to `Written`. Fails with
/// [`WebfixError::ArtifactRead`], [`WebfixError::CritiqueService`],
/// [`WebfixError::GenerationService`] or [`WebfixError::ArtifactWrite`].
#[allow(clippy::too_many_arguments)]
pub async fn correct_artifact(
    workspace: &Path,
    file_path: &str,
    corrections: &str,
    critic: &dyn CritiqueService,
    generator: &dyn GenerationService,
    tier: ModelTier,
    agent_id: Uuid,
    tracker: &mut StateTracker,
) -> Result<DiffReport> {
    let artifact = workspace.join(file_path);
    let original = tokio::fs::read_to_string(&artifact)
        .await
        .map_err(|source| WebfixError::ArtifactRead {
            path: artifact.clone(),
            source,
        })?;

    tracker.stage(Stage::Critique);
    let context = ConversationContext::for_content(agent_id, original.as_str());
    let critique = critic
        .critique(&context, &original)
        .await
        .map_err(WebfixError::CritiqueService)?;
    debug!(
        findings = critique.findings.len(),
        score = critique.score,
        "critique received"
    );
    tracker.enter(PipelineState::Analyzed);

    tracker.stage(Stage::Generation);
    let prompt = build_generation_prompt(corrections, &critique.findings, &original);
    let corrected = generator
        .generate(&prompt, tier)
        .await
        .map_err(WebfixError::GenerationService)?;
    tracker.enter(PipelineState::Regenerated);

    let diff = diff_lines(&original, &corrected);
    tracker.record(PipelineEvent::ChangesComputed(ChangeSummary::from_diff(&diff)));

    tracker.stage(Stage::Write);
    tokio::fs::write(&artifact, corrected.as_bytes())
        .await
        .map_err(|source| WebfixError::ArtifactWrite {
            path: artifact.clone(),
            source,
        })?;
    tracker.enter(PipelineState::Written);

    Ok(diff)
}

/// The full clone → correct → publish pipeline.
///
/// Cheap to share: every collaborator sits behind an `Arc`, and concurrent
/// invocations each get their own workspace.
pub struct CorrectionPipeline {
    remote: Arc<dyn RemoteSyncClient>,
    critic: Arc<dyn CritiqueService>,
    generator: Arc<dyn GenerationService>,
    observer: Arc<dyn PipelineObserver>,
    workspaces: WorkspaceManager,
    config: PipelineConfig,
    agent_id: Uuid,
}

impl CorrectionPipeline {
    pub fn new(
        remote: Arc<dyn RemoteSyncClient>,
        critic: Arc<dyn CritiqueService>,
        generator: Arc<dyn GenerationService>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            remote,
            critic,
            generator,
            observer: Arc::new(TracingObserver),
            workspaces: WorkspaceManager::new(config.workspace_root.clone()),
            config,
            agent_id: Uuid::new_v4(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one correction end to end.
    ///
    /// Validation happens before any side effect. Once a workspace is
    /// acquired it is released exactly once, whatever the outcome; a cleanup
    /// failure is logged and never replaces the primary error.
    pub async fn run(&self, request: &CorrectionRequest) -> Result<PipelineResult> {
        let redactor = Redactor::for_credential(&request.credential);

        if let Err(err) = request.validate() {
            let err = WebfixError::from(err);
            self.report_failure(UNASSIGNED_RUN, PipelineState::Idle, &err, &redactor);
            return Err(err);
        }

        let workspace = match self.workspaces.acquire() {
            Ok(ws) => ws,
            Err(err) => {
                self.report_failure(UNASSIGNED_RUN, PipelineState::Idle, &err, &redactor);
                return Err(err);
            }
        };

        let run_id = workspace.id().to_string();
        self.run_in(workspace, request, &redactor)
            .instrument(run_span(&run_id))
            .await
    }

    async fn run_in(
        &self,
        workspace: Workspace,
        request: &CorrectionRequest,
        redactor: &Redactor,
    ) -> Result<PipelineResult> {
        let mut tracker = StateTracker::new(workspace.id(), self.observer.clone());
        tracker.enter(PipelineState::WorkspaceAcquired);

        // A panicking collaborator is reported like any other stage failure.
        let outcome = AssertUnwindSafe(self.stages(workspace.path(), request, redactor, &mut tracker))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(WebfixError::from_panic(payload)));

        let last_state = tracker.state();
        if let Err(err) = workspace.release() {
            tracker.record(PipelineEvent::CleanupFailed {
                error: redactor.redact(&err.to_string()),
            });
        }
        tracker.enter(PipelineState::Released);

        match outcome {
            Ok(result) => {
                tracker.record(PipelineEvent::Completed(result));
                Ok(result)
            }
            Err(err) => {
                self.report_failure(tracker.run_id(), last_state, &err, redactor);
                Err(err)
            }
        }
    }

    async fn stages(
        &self,
        workspace: &Path,
        request: &CorrectionRequest,
        redactor: &Redactor,
        tracker: &mut StateTracker,
    ) -> Result<PipelineResult> {
        tracker.stage(Stage::Clone);
        self.remote
            .clone_repo(
                &request.repo_url,
                &request.credential,
                &request.username,
                workspace,
            )
            .await?;
        tracker.enter(PipelineState::Cloned);

        let diff = correct_artifact(
            workspace,
            &request.file_path,
            &request.corrections,
            self.critic.as_ref(),
            self.generator.as_ref(),
            self.config.model_tier,
            self.agent_id,
            tracker,
        )
        .await?;

        tracker.stage(Stage::Push);
        let identity = Identity::for_user(&request.username, &self.config.email_domain);
        self.remote
            .commit_and_push(workspace, &identity, &self.config.commit_message, redactor)
            .await?;
        tracker.enter(PipelineState::Pushed);

        Ok(PipelineResult::from_diff(&diff))
    }

    fn report_failure(
        &self,
        run_id: &str,
        state: PipelineState,
        err: &WebfixError,
        redactor: &Redactor,
    ) {
        self.observer.record(
            run_id,
            &PipelineEvent::Failed {
                state,
                kind: err.kind(),
                error: redactor.redact(&err.to_string()),
            },
        );
    }
}
