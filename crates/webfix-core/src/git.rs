//! Remote synchronisation through the `git` command line.
//!
//! [`RemoteSyncClient`] exposes the two capabilities the pipeline needs:
//! cloning into a workspace and publishing the workspace's changes.
//! [`GitCliClient`] implements them by spawning `git` directly (argument
//! vectors, no shell). Every command line and every captured stderr is passed
//! through a [`Redactor`] before it is logged or placed in an error.

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use crate::domain::{Credential, Result, WebfixError};
use crate::redact::Redactor;

/// Commit author identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    /// Identity whose email is `<name>@<email_domain>`.
    pub fn for_user(name: &str, email_domain: &str) -> Self {
        Self {
            name: name.to_string(),
            email: format!("{name}@{email_domain}"),
        }
    }
}

/// Clone and publish operations against a remote repository.
#[async_trait]
pub trait RemoteSyncClient: Send + Sync {
    /// Clone `repo_url` into `destination`, authenticating as `username`.
    ///
    /// Fails with [`WebfixError::Clone`].
    async fn clone_repo(
        &self,
        repo_url: &str,
        credential: &Credential,
        username: &str,
        destination: &Path,
    ) -> Result<()>;

    /// Configure the author, stage everything, commit, and push.
    ///
    /// The first failing step aborts the sequence with
    /// [`WebfixError::GitCommand`].
    async fn commit_and_push(
        &self,
        destination: &Path,
        identity: &Identity,
        message: &str,
        redactor: &Redactor,
    ) -> Result<()>;
}

/// Embed `username:credential` into an `https://` URL.
///
/// Both parts are percent-encoded, so `@`, `:`, `/` or `#` in either cannot
/// break the authority. Non-HTTPS locations (local paths, `file://`) are
/// returned unchanged.
pub fn credentialed_url(repo_url: &str, username: &str, credential: &Credential) -> String {
    match repo_url.strip_prefix("https://") {
        Some(rest) => format!(
            "https://{}:{}@{rest}",
            urlencoding::encode(username),
            urlencoding::encode(credential.expose())
        ),
        None => repo_url.to_string(),
    }
}

/// Captured result of one external command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run `program args..` in `cwd` and capture its output.
///
/// Spawn failures are reported as an `Err` holding the io error text.
pub async fn run_command(
    program: &str,
    args: &[String],
    cwd: Option<&Path>,
) -> std::result::Result<CommandOutput, String> {
    let start = Instant::now();

    let mut command = Command::new(program);
    command
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let output = command
        .output()
        .await
        .map_err(|e| format!("failed to run {program}: {e}"))?;

    Ok(CommandOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

/// Render an argument vector the way a shell user would type it.
fn display_command(program: &str, args: &[String]) -> String {
    let mut parts = vec![program.to_string()];
    for arg in args {
        if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('"') {
            parts.push(format!("\"{}\"", arg.replace('"', "\\\"")));
        } else {
            parts.push(arg.clone());
        }
    }
    parts.join(" ")
}

/// [`RemoteSyncClient`] backed by the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCliClient {
    program: String,
    /// Branch to push; `None` pushes the checked-out branch (`HEAD`).
    push_branch: Option<String>,
}

impl Default for GitCliClient {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            push_branch: None,
        }
    }
}

impl GitCliClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_push_branch(mut self, branch: Option<String>) -> Self {
        self.push_branch = branch;
        self
    }

    /// Use a different executable, e.g. a wrapper script.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// The fail-fast command sequence run by `commit_and_push`.
    pub fn publish_commands(&self, identity: &Identity, message: &str) -> Vec<Vec<String>> {
        let branch = self.push_branch.as_deref().unwrap_or("HEAD");
        [
            vec!["config", "user.name", identity.name.as_str()],
            vec!["config", "user.email", identity.email.as_str()],
            vec!["add", "."],
            vec!["commit", "-m", message],
            vec!["push", "origin", branch],
        ]
        .into_iter()
        .map(|args| args.into_iter().map(String::from).collect())
        .collect()
    }
}

#[async_trait]
impl RemoteSyncClient for GitCliClient {
    async fn clone_repo(
        &self,
        repo_url: &str,
        credential: &Credential,
        username: &str,
        destination: &Path,
    ) -> Result<()> {
        let redactor = Redactor::for_credential(credential);
        let args = vec![
            "clone".to_string(),
            credentialed_url(repo_url, username, credential),
            destination.to_string_lossy().to_string(),
        ];
        info!(
            command = %redactor.redact(&display_command(&self.program, &args)),
            "Executing git command"
        );

        let output = run_command(&self.program, &args, None)
            .await
            .map_err(|e| WebfixError::Clone {
                exit_code: -1,
                stderr: redactor.redact(&e),
            })?;

        if !output.success() {
            return Err(WebfixError::Clone {
                exit_code: output.exit_code,
                stderr: redactor.redact(output.stderr.trim()),
            });
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
        for args in self.publish_commands(identity, message) {
            let command = redactor.redact(&display_command(&self.program, &args));
            info!(command = %command, "Executing git command");

            let output = run_command(&self.program, &args, Some(destination))
                .await
                .map_err(|e| WebfixError::GitCommand {
                    command: command.clone(),
                    exit_code: -1,
                    stderr: redactor.redact(&e),
                })?;

            if !output.success() {
                // `git commit` reports "nothing to commit" on stdout.
                let detail = if output.stderr.trim().is_empty() {
                    output.stdout.trim()
                } else {
                    output.stderr.trim()
                };
                return Err(WebfixError::GitCommand {
                    command,
                    exit_code: output.exit_code,
                    stderr: redactor.redact(detail),
                });
            }
        }
        Ok(())
    }
}
