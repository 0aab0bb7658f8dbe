//! Operation log for pipeline invocations.
//!
//! The pipeline reports every state transition and stage start to an
//! injected [`PipelineObserver`]. [`TracingObserver`] turns them into
//! structured `tracing` records with an `event = "pipeline.*"` field.
//!
//! Events are emitted at `info!` level; failures at `error!`, cleanup
//! failures at `warn!`. Set `RUST_LOG` to filter.

use tracing::{error, info, warn};

use crate::pipeline::{PipelineState, Stage};
use crate::report::{ChangeSummary, PipelineResult};

/// Span tagging every record of one invocation with its run id.
///
/// Attach it with [`tracing::Instrument`] so the pipeline future stays `Send`.
pub fn run_span(run_id: &str) -> tracing::Span {
    tracing::info_span!("webfix.run", run_id = %run_id)
}

/// Something that happened during a pipeline invocation.
///
/// Error text carried here is already redacted.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StateEntered(PipelineState),
    StageStarted(Stage),
    ChangesComputed(ChangeSummary),
    Completed(PipelineResult),
    Failed {
        state: PipelineState,
        kind: &'static str,
        error: String,
    },
    CleanupFailed {
        error: String,
    },
}

/// Sink for pipeline events. Shared across invocations.
pub trait PipelineObserver: Send + Sync {
    fn record(&self, run_id: &str, event: &PipelineEvent);
}

/// Observer writing each event as a structured tracing record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn record(&self, run_id: &str, event: &PipelineEvent) {
        match event {
            PipelineEvent::StateEntered(state) => emit_state_entered(run_id, *state),
            PipelineEvent::StageStarted(stage) => emit_stage_started(run_id, *stage),
            PipelineEvent::ChangesComputed(summary) => emit_changes_computed(run_id, summary),
            PipelineEvent::Completed(result) => emit_pipeline_completed(run_id, result),
            PipelineEvent::Failed { state, kind, error } => {
                emit_pipeline_failed(run_id, *state, kind, error)
            }
            PipelineEvent::CleanupFailed { error } => emit_cleanup_failed(run_id, error),
        }
    }
}

/// Emit event: the run entered a new pipeline state.
///
/// # Example
///
/// ```ignore
/// emit_state_entered("webfix-20260101T000000-ab12", PipelineState::Cloned);
/// // logs: event=pipeline.state run_id=webfix-20260101T000000-ab12 state=cloned
/// ```
pub fn emit_state_entered(run_id: &str, state: PipelineState) {
    info!(event = "pipeline.state", run_id = %run_id, state = state.name());
}

/// Emit event: a stage is about to run.
pub fn emit_stage_started(run_id: &str, stage: Stage) {
    info!(event = "pipeline.stage_started", run_id = %run_id, stage = stage.name());
}

/// Emit event: the line diff was computed, with per-kind counts and the
/// first characters of each changed segment.
pub fn emit_changes_computed(run_id: &str, summary: &ChangeSummary) {
    let previews = serde_json::to_string(&summary.previews).unwrap_or_default();
    info!(
        event = "pipeline.changes",
        run_id = %run_id,
        segments = summary.segments,
        added = summary.added,
        removed = summary.removed,
        unchanged = summary.unchanged,
        previews = %previews,
    );
}

/// Emit event: the run finished and the result was published.
pub fn emit_pipeline_completed(run_id: &str, result: &PipelineResult) {
    info!(
        event = "pipeline.completed",
        run_id = %run_id,
        success = result.success,
        changes = result.changes,
    );
}

/// Emit event: the run failed (error level).
///
/// `state` is the last state reached before the failure; `error` must
/// already be redacted.
pub fn emit_pipeline_failed(run_id: &str, state: PipelineState, kind: &str, error: &str) {
    error!(
        event = "pipeline.failed",
        run_id = %run_id,
        state = state.name(),
        kind = %kind,
        error = %error,
    );
}

/// Emit event: the workspace could not be removed (warning level).
pub fn emit_cleanup_failed(run_id: &str, error: &str) {
    warn!(event = "pipeline.cleanup_failed", run_id = %run_id, error = %error);
}
