//! In-memory fakes for the pipeline's collaborators (testing only)
//!
//! Provides `FakeRemoteSync`, `FakeCritic`, `FakeGenerator`, and
//! `RecordingObserver`, which satisfy the trait contracts without git or
//! network access.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{
    ConversationContext, Credential, CritiqueResult, Finding, ModelTier, Result, ServiceError,
    WebfixError,
};
use crate::git::{credentialed_url, Identity, RemoteSyncClient};
use crate::obs::{PipelineEvent, PipelineObserver};
use crate::redact::Redactor;
use crate::service::{CritiqueService, GenerationService};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ---------------------------------------------------------------------------
// FakeRemoteSync
// ---------------------------------------------------------------------------

/// A call received by [`FakeRemoteSync`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    Clone {
        repo_url: String,
        username: String,
        destination: PathBuf,
    },
    Publish {
        destination: PathBuf,
        identity: Identity,
        message: String,
    },
}

/// Remote that "clones" by writing seeded files into the destination.
///
/// On a successful publish it snapshots the seeded files' contents so tests
/// can inspect what would have been pushed.
#[derive(Debug, Default)]
pub struct FakeRemoteSync {
    files: Vec<(String, String)>,
    fail_clone: bool,
    fail_push: bool,
    unremovable: bool,
    calls: Mutex<Vec<RemoteCall>>,
    origin: Mutex<Option<String>>,
    published: Mutex<Vec<(String, String)>>,
}

impl FakeRemoteSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file that every clone will contain.
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.push((path.into(), content.into()));
        self
    }

    pub fn failing_clone(mut self) -> Self {
        self.fail_clone = true;
        self
    }

    /// Fail the clone after swapping the destination directory for a plain
    /// file, so the workspace can no longer be removed as a tree.
    pub fn leaving_unremovable_workspace(mut self) -> Self {
        self.fail_clone = true;
        self.unremovable = true;
        self
    }

    /// Make the final push step fail with exit code 1.
    pub fn failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        lock(&self.calls).clone()
    }

    /// Workspace directories this remote was asked to clone into.
    pub fn destinations(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RemoteCall::Clone { destination, .. } => Some(destination),
                RemoteCall::Publish { .. } => None,
            })
            .collect()
    }

    /// File contents captured by successful publishes.
    pub fn published(&self) -> Vec<(String, String)> {
        lock(&self.published).clone()
    }
}

#[async_trait]
impl RemoteSyncClient for FakeRemoteSync {
    async fn clone_repo(
        &self,
        repo_url: &str,
        credential: &Credential,
        username: &str,
        destination: &Path,
    ) -> Result<()> {
        lock(&self.calls).push(RemoteCall::Clone {
            repo_url: repo_url.to_string(),
            username: username.to_string(),
            destination: destination.to_path_buf(),
        });

        let url = credentialed_url(repo_url, username, credential);
        *lock(&self.origin) = Some(url.clone());

        if self.unremovable {
            std::fs::remove_dir(destination)
                .and_then(|()| std::fs::write(destination, "not a directory"))
                .map_err(|e| WebfixError::Clone {
                    exit_code: -1,
                    stderr: e.to_string(),
                })?;
        }

        if self.fail_clone {
            return Err(WebfixError::Clone {
                exit_code: 128,
                stderr: Redactor::for_credential(credential)
                    .redact(&format!("fatal: repository '{url}' not found")),
            });
        }

        for (path, content) in &self.files {
            let target = destination.join(path);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|e| WebfixError::Clone {
                    exit_code: -1,
                    stderr: e.to_string(),
                })?;
            }
            std::fs::write(&target, content).map_err(|e| WebfixError::Clone {
                exit_code: -1,
                stderr: e.to_string(),
            })?;
        }
        Ok(())
    }

    async fn commit_and_push(
        &self,
        destination: &Path,
        identity: &Identity,
        message: &str,
        redactor: &Redactor,
    ) -> Result<()> {
        lock(&self.calls).push(RemoteCall::Publish {
            destination: destination.to_path_buf(),
            identity: identity.clone(),
            message: message.to_string(),
        });

        if self.fail_push {
            // Like git, the error names the origin URL with its embedded token.
            let url = lock(&self.origin).clone().unwrap_or_default();
            return Err(WebfixError::GitCommand {
                command: redactor.redact("git push origin HEAD"),
                exit_code: 1,
                stderr: redactor.redact(&format!("error: failed to push some refs to '{url}'")),
            });
        }

        let mut published = lock(&self.published);
        for (path, _) in &self.files {
            let content = std::fs::read_to_string(destination.join(path)).unwrap_or_default();
            published.push((path.clone(), content));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeCritic
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Outcome<T> {
    Succeed(T),
    Fail(String),
    Panic(String),
}

/// Critique service returning a canned result.
#[derive(Debug)]
pub struct FakeCritic {
    outcome: Outcome<CritiqueResult>,
    contexts: Mutex<Vec<ConversationContext>>,
}

impl FakeCritic {
    pub fn returning(findings: Vec<Finding>, score: f64) -> Self {
        Self {
            outcome: Outcome::Succeed(CritiqueResult { findings, score }),
            contexts: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call with [`ServiceError::Http`].
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Fail(message.into()),
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn panicking(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Panic(message.into()),
            contexts: Mutex::new(Vec::new()),
        }
    }

    /// Contexts received, in call order.
    pub fn contexts(&self) -> Vec<ConversationContext> {
        lock(&self.contexts).clone()
    }
}

#[async_trait]
impl CritiqueService for FakeCritic {
    async fn critique(
        &self,
        context: &ConversationContext,
        _content: &str,
    ) -> std::result::Result<CritiqueResult, ServiceError> {
        lock(&self.contexts).push(context.clone());
        match &self.outcome {
            Outcome::Succeed(result) => Ok(result.clone()),
            Outcome::Fail(message) => Err(ServiceError::Http(message.clone())),
            Outcome::Panic(message) => panic!("{message}"),
        }
    }
}

// ---------------------------------------------------------------------------
// FakeGenerator
// ---------------------------------------------------------------------------

type Hook = Box<dyn Fn() + Send + Sync>;

/// Generation service returning canned content and recording prompts.
pub struct FakeGenerator {
    outcome: Outcome<String>,
    prompts: Mutex<Vec<(String, ModelTier)>>,
    on_generate: Option<Hook>,
}

impl std::fmt::Debug for FakeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeGenerator")
            .field("outcome", &self.outcome)
            .field("prompts", &self.prompts)
            .field("on_generate", &self.on_generate.is_some())
            .finish()
    }
}

impl FakeGenerator {
    pub fn returning(content: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Succeed(content.into()),
            prompts: Mutex::new(Vec::new()),
            on_generate: None,
        }
    }

    /// Fail every call with [`ServiceError::Status`] 503.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Fail(message.into()),
            prompts: Mutex::new(Vec::new()),
            on_generate: None,
        }
    }

    pub fn panicking(message: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Panic(message.into()),
            prompts: Mutex::new(Vec::new()),
            on_generate: None,
        }
    }

    /// Run `hook` on every call, before the outcome is produced.
    pub fn on_generate(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_generate = Some(Box::new(hook));
        self
    }

    pub fn prompts(&self) -> Vec<(String, ModelTier)> {
        lock(&self.prompts).clone()
    }
}

#[async_trait]
impl GenerationService for FakeGenerator {
    async fn generate(
        &self,
        prompt: &str,
        tier: ModelTier,
    ) -> std::result::Result<String, ServiceError> {
        lock(&self.prompts).push((prompt.to_string(), tier));
        if let Some(hook) = &self.on_generate {
            hook();
        }
        match &self.outcome {
            Outcome::Succeed(content) => Ok(content.clone()),
            Outcome::Fail(message) => Err(ServiceError::Status {
                status: 503,
                body: message.clone(),
            }),
            Outcome::Panic(message) => panic!("{message}"),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingObserver
// ---------------------------------------------------------------------------

/// Observer keeping every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    records: Mutex<Vec<(String, PipelineEvent)>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        lock(&self.records).iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn run_ids(&self) -> Vec<String> {
        lock(&self.records).iter().map(|(id, _)| id.clone()).collect()
    }

    /// Every event rendered with `Debug`, one per line.
    pub fn transcript(&self) -> String {
        self.events()
            .iter()
            .map(|e| format!("{e:?}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl PipelineObserver for RecordingObserver {
    fn record(&self, run_id: &str, event: &PipelineEvent) {
        lock(&self.records).push((run_id.to_string(), event.clone()));
    }
}
