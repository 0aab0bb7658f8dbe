//! End-to-end pipeline behaviour against in-memory collaborators.

use std::path::Path;
use std::sync::Arc;

use webfix_core::fakes::{FakeCritic, FakeGenerator, FakeRemoteSync, RecordingObserver, RemoteCall};
use webfix_core::{
    CorrectionPipeline, CorrectionRequest, Credential, Finding, ModelTier, PipelineConfig,
    PipelineEvent, PipelineState, Stage, ValidationError, WebfixError,
};

const TOKEN: &str = "ghp_TopSecretToken123";
const REPO: &str = "https://github.com/acme/site.git";

struct Harness {
    root: tempfile::TempDir,
    remote: Arc<FakeRemoteSync>,
    critic: Arc<FakeCritic>,
    generator: Arc<FakeGenerator>,
    observer: Arc<RecordingObserver>,
}

impl Harness {
    fn new(remote: FakeRemoteSync, critic: FakeCritic, generator: FakeGenerator) -> Self {
        Self::with_shared_remote(Arc::new(remote), critic, generator)
    }

    fn with_shared_remote(
        remote: Arc<FakeRemoteSync>,
        critic: FakeCritic,
        generator: FakeGenerator,
    ) -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
            remote,
            critic: Arc::new(critic),
            generator: Arc::new(generator),
            observer: Arc::new(RecordingObserver::new()),
        }
    }

    fn workspace_root(&self) -> std::path::PathBuf {
        self.root.path().join("workspaces")
    }

    fn pipeline(&self) -> CorrectionPipeline {
        let config = PipelineConfig::default().with_workspace_root(self.workspace_root());
        CorrectionPipeline::new(
            self.remote.clone(),
            self.critic.clone(),
            self.generator.clone(),
            config,
        )
        .with_observer(self.observer.clone())
    }

    fn leftover_workspaces(&self) -> usize {
        match std::fs::read_dir(self.workspace_root()) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    fn states(&self) -> Vec<PipelineState> {
        self.observer
            .events()
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::StateEntered(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    fn stages(&self) -> Vec<Stage> {
        self.observer
            .events()
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::StageStarted(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    fn failure(&self) -> Option<(PipelineState, &'static str)> {
        self.observer.events().into_iter().find_map(|e| match e {
            PipelineEvent::Failed { state, kind, .. } => Some((state, kind)),
            _ => None,
        })
    }
}

fn request(corrections: &str) -> CorrectionRequest {
    CorrectionRequest::new(
        REPO,
        "index.html",
        Credential::new(TOKEN),
        "octocat",
        corrections,
    )
}

fn site() -> FakeRemoteSync {
    FakeRemoteSync::new().with_file("index.html", "<p>Hi</p>")
}

fn critic() -> FakeCritic {
    FakeCritic::returning(vec![Finding::new("greeting too terse", "content")], 7.0)
}

fn assert_released(h: &Harness) {
    assert_eq!(h.leftover_workspaces(), 0, "workspace left behind");
    for dest in h.remote.destinations() {
        assert!(!dest.exists(), "{} still exists", dest.display());
    }
    assert_eq!(h.states().last(), Some(&PipelineState::Released));
    let released = h
        .states()
        .iter()
        .filter(|s| **s == PipelineState::Released)
        .count();
    assert_eq!(released, 1);
}

#[tokio::test]
async fn empty_corrections_rejected_before_any_side_effect() {
    let h = Harness::new(site(), critic(), FakeGenerator::returning("<p>Hello</p>"));

    let err = h.pipeline().run(&request("")).await.unwrap_err();

    assert!(matches!(
        err,
        WebfixError::Validation(ValidationError::MissingField {
            field: "corrections"
        })
    ));
    assert!(!h.workspace_root().exists());
    assert!(h.remote.calls().is_empty());
    assert!(h.critic.contexts().is_empty());
    assert_eq!(h.failure(), Some((PipelineState::Idle, "validation")));
}

#[tokio::test]
async fn critique_failure_still_removes_workspace() {
    let h = Harness::new(
        site(),
        FakeCritic::failing("connection refused"),
        FakeGenerator::returning("<p>Hello</p>"),
    );

    let err = h.pipeline().run(&request("be friendlier")).await.unwrap_err();

    match err {
        WebfixError::CritiqueService(inner) => {
            assert!(inner.to_string().contains("connection refused"))
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(h.generator.prompts().is_empty());
    assert_released(&h);
    assert_eq!(h.failure(), Some((PipelineState::Cloned, "critique_service")));
}

#[tokio::test]
async fn successful_run_reports_change_count_and_publishes() {
    let h = Harness::new(site(), critic(), FakeGenerator::returning("<p>Hello</p>"));

    let result = h.pipeline().run(&request("be friendlier")).await.unwrap();

    assert!(result.success);
    assert_eq!(result.changes, 2);
    assert_eq!(
        h.remote.published(),
        vec![("index.html".to_string(), "<p>Hello</p>".to_string())]
    );
    assert_eq!(
        h.states(),
        vec![
            PipelineState::WorkspaceAcquired,
            PipelineState::Cloned,
            PipelineState::Analyzed,
            PipelineState::Regenerated,
            PipelineState::Written,
            PipelineState::Pushed,
            PipelineState::Released,
        ]
    );
    assert_eq!(
        h.stages(),
        vec![
            Stage::Clone,
            Stage::Critique,
            Stage::Generation,
            Stage::Write,
            Stage::Push,
        ]
    );
    assert!(h
        .observer
        .events()
        .contains(&PipelineEvent::Completed(result)));
    assert_released(&h);
}

#[tokio::test]
async fn publish_uses_username_identity_and_commit_message() {
    let h = Harness::new(site(), critic(), FakeGenerator::returning("<p>Hello</p>"));

    h.pipeline().run(&request("be friendlier")).await.unwrap();

    let publish = h
        .remote
        .calls()
        .into_iter()
        .find_map(|c| match c {
            RemoteCall::Publish {
                identity, message, ..
            } => Some((identity, message)),
            _ => None,
        })
        .unwrap();
    assert_eq!(publish.0.name, "octocat");
    assert_eq!(publish.0.email, "octocat@users.noreply.github.com");
    assert_eq!(publish.1, "Applied HTML corrections");
}

#[tokio::test]
async fn prompt_carries_intent_findings_and_content() {
    let h = Harness::new(site(), critic(), FakeGenerator::returning("<p>Hello</p>"));

    h.pipeline().run(&request("be friendlier")).await.unwrap();

    let prompts = h.generator.prompts();
    assert_eq!(prompts.len(), 1);
    let (prompt, tier) = &prompts[0];
    assert_eq!(*tier, ModelTier::Medium);
    assert!(prompt.contains("be friendlier"));
    assert!(prompt.contains("- greeting too terse (content)"));
    assert!(prompt.ends_with("<p>Hi</p>"));

    let contexts = h.critic.contexts();
    assert_eq!(contexts[0].text, "<p>Hi</p>");
    assert!(contexts[0].room_id.is_nil());
}

#[tokio::test]
async fn push_failure_names_command_and_hides_credential() {
    let h = Harness::new(
        site().failing_push(),
        critic(),
        FakeGenerator::returning("<p>Hello</p>"),
    );

    let err = h.pipeline().run(&request("be friendlier")).await.unwrap_err();

    match &err {
        WebfixError::GitCommand {
            command, exit_code, ..
        } => {
            assert!(command.contains("push"));
            assert_eq!(*exit_code, 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.to_string().contains(TOKEN));
    assert!(err.to_string().contains("***"));
    assert!(!h.observer.transcript().contains(TOKEN));
    assert_eq!(h.failure(), Some((PipelineState::Written, "git_command")));
    assert_released(&h);
}

#[tokio::test]
async fn clone_failure_is_classified_and_cleaned_up() {
    let h = Harness::new(
        site().failing_clone(),
        critic(),
        FakeGenerator::returning("<p>Hello</p>"),
    );

    let err = h.pipeline().run(&request("be friendlier")).await.unwrap_err();

    assert_eq!(err.kind(), "clone");
    assert!(!err.to_string().contains(TOKEN));
    assert!(h.critic.contexts().is_empty());
    assert_eq!(h.failure(), Some((PipelineState::WorkspaceAcquired, "clone")));
    assert_released(&h);
}

#[tokio::test]
async fn missing_artifact_is_a_read_error() {
    let h = Harness::new(
        FakeRemoteSync::new().with_file("other.html", "<p/>"),
        critic(),
        FakeGenerator::returning("<p>Hello</p>"),
    );

    let err = h.pipeline().run(&request("be friendlier")).await.unwrap_err();

    assert!(matches!(err, WebfixError::ArtifactRead { .. }));
    assert!(h.critic.contexts().is_empty());
    assert_released(&h);
}

#[tokio::test]
async fn generation_failure_leaves_nothing_published() {
    let h = Harness::new(site(), critic(), FakeGenerator::failing("overloaded"));

    let err = h.pipeline().run(&request("be friendlier")).await.unwrap_err();

    assert_eq!(err.kind(), "generation_service");
    assert!(!h
        .remote
        .calls()
        .iter()
        .any(|c| matches!(c, RemoteCall::Publish { .. })));
    assert_eq!(
        h.failure(),
        Some((PipelineState::Analyzed, "generation_service"))
    );
    assert_released(&h);
}

#[tokio::test]
async fn write_failure_is_classified_and_cleaned_up() {
    let remote = Arc::new(site());
    let watched = remote.clone();
    // Put a directory where the artifact was, after it has been read.
    let generator = FakeGenerator::returning("<p>Hello</p>").on_generate(move || {
        let artifact = watched.destinations().pop().unwrap().join("index.html");
        std::fs::remove_file(&artifact).unwrap();
        std::fs::create_dir(&artifact).unwrap();
    });
    let h = Harness::with_shared_remote(remote, critic(), generator);

    let err = h.pipeline().run(&request("be friendlier")).await.unwrap_err();

    assert!(matches!(err, WebfixError::ArtifactWrite { .. }), "{err:?}");
    assert!(!h
        .remote
        .calls()
        .iter()
        .any(|c| matches!(c, RemoteCall::Publish { .. })));
    assert_eq!(
        h.failure(),
        Some((PipelineState::Regenerated, "artifact_write"))
    );
    assert_eq!(h.stages().last(), Some(&Stage::Write));
    assert_released(&h);
}

#[tokio::test]
async fn cleanup_failure_does_not_mask_the_stage_error() {
    let h = Harness::new(
        site().leaving_unremovable_workspace(),
        critic(),
        FakeGenerator::returning("<p>Hello</p>"),
    );

    let err = h.pipeline().run(&request("be friendlier")).await.unwrap_err();

    assert_eq!(err.kind(), "clone");
    assert!(!err.to_string().contains(TOKEN));

    let events = h.observer.events();
    let cleanup_at = events
        .iter()
        .position(|e| matches!(e, PipelineEvent::CleanupFailed { .. }))
        .expect("cleanup failure recorded");
    let failed_at = events
        .iter()
        .position(|e| matches!(e, PipelineEvent::Failed { .. }))
        .unwrap();
    assert!(cleanup_at < failed_at);
    assert!(!h.observer.transcript().contains(TOKEN));
    assert_eq!(h.failure(), Some((PipelineState::WorkspaceAcquired, "clone")));

    // Released is still entered exactly once, after the attempt.
    let states = h.states();
    assert_eq!(states.last(), Some(&PipelineState::Released));
    assert_eq!(
        states
            .iter()
            .filter(|s| **s == PipelineState::Released)
            .count(),
        1
    );
}

#[tokio::test]
async fn panicking_service_is_reported_and_cleaned_up() {
    let h = Harness::new(
        site(),
        FakeCritic::panicking("critic blew up"),
        FakeGenerator::returning("<p>Hello</p>"),
    );

    let err = h.pipeline().run(&request("be friendlier")).await.unwrap_err();

    assert_eq!(err.kind(), "pipeline");
    assert!(err.to_string().contains("critic blew up"));
    assert_released(&h);

    let h = Harness::new(
        site(),
        critic(),
        FakeGenerator::panicking("generator blew up"),
    );
    let err = h.pipeline().run(&request("be friendlier")).await.unwrap_err();
    assert!(err.to_string().contains("generator blew up"));
    assert_released(&h);
}

#[tokio::test]
async fn unchanged_output_reports_zero_changes() {
    let h = Harness::new(site(), critic(), FakeGenerator::returning("<p>Hi</p>"));

    let result = h.pipeline().run(&request("leave it")).await.unwrap();

    assert!(result.success);
    assert_eq!(result.changes, 0);
}

#[tokio::test]
async fn nested_artifact_path_is_resolved_inside_workspace() {
    let h = Harness::new(
        FakeRemoteSync::new().with_file("docs/about/index.html", "<h1>About</h1>\n"),
        critic(),
        FakeGenerator::returning("<h1>About us</h1>\n"),
    );
    let req = CorrectionRequest::new(
        REPO,
        "docs/about/index.html",
        Credential::new(TOKEN),
        "octocat",
        "expand heading",
    );

    let result = h.pipeline().run(&req).await.unwrap();

    assert_eq!(result.changes, 2);
    assert_eq!(h.remote.published()[0].1, "<h1>About us</h1>\n");
}

#[tokio::test]
async fn concurrent_runs_use_distinct_workspaces() {
    let h = Harness::new(site(), critic(), FakeGenerator::returning("<p>Hello</p>"));
    let pipeline = Arc::new(h.pipeline());

    let mut handles = Vec::new();
    for _ in 0..4 {
        let pipeline = pipeline.clone();
        handles.push(tokio::spawn(async move {
            pipeline.run(&request("be friendlier")).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().success);
    }

    let mut dests = h.remote.destinations();
    assert_eq!(dests.len(), 4);
    dests.sort();
    dests.dedup();
    assert_eq!(dests.len(), 4);
    assert!(dests.iter().all(|d| !Path::new(d).exists()));
    assert_eq!(h.leftover_workspaces(), 0);
}

#[tokio::test]
async fn unusable_workspace_root_fails_creation() {
    let h = Harness::new(site(), critic(), FakeGenerator::returning("<p>Hello</p>"));
    std::fs::write(h.workspace_root(), "not a directory").unwrap();

    let err = h.pipeline().run(&request("be friendlier")).await.unwrap_err();

    assert_eq!(err.kind(), "workspace_creation");
    assert!(h.remote.calls().is_empty());
}
