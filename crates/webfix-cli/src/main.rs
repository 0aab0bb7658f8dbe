//! Webfix CLI
//!
//! The `webfix` command corrects one HTML file in a remote repository.
//!
//! ## Commands
//!
//! - `fix`: clone, critique, regenerate, and push one file
//! - `diff`: show the line diff between two local files

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

use webfix_core::telemetry::{init_tracing, LogFormat};
use webfix_core::{
    diff_lines, ChangeSummary, CorrectionPipeline, CorrectionRequest, Credential, DiffReport,
    GitCliClient, ModelTier, PipelineConfig, Redactor, SegmentKind,
};
use webfix_llm::{LlmClient, LlmConfig, LlmCritic, LlmGenerator};

#[derive(Parser)]
#[command(name = "webfix")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Critique, regenerate and republish an HTML file in a git repository", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correct one HTML file and push the result
    Fix {
        /// HTTPS URL of the repository
        #[arg(long)]
        repo_url: String,

        /// File to correct, relative to the repository root
        #[arg(long = "file")]
        file_path: String,

        /// Access token used for clone and push
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: String,

        /// Account name used to authenticate and to author the commit
        #[arg(long)]
        username: String,

        /// Description of the corrections to apply
        #[arg(long)]
        corrections: String,

        /// Directory under which temporary workspaces are created
        #[arg(long)]
        workspace_root: Option<PathBuf>,

        /// Branch to push (default: the cloned branch)
        #[arg(long)]
        branch: Option<String>,

        /// Commit message
        #[arg(short, long)]
        message: Option<String>,

        /// Model tier for generation: small, medium or large
        #[arg(long)]
        tier: Option<ModelTier>,
    },

    /// Show the line diff between two local files
    Diff {
        /// Original file
        old: PathBuf,

        /// Corrected file
        new: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let format = if cli.json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_tracing(format, level);

    match cli.command {
        Commands::Fix {
            repo_url,
            file_path,
            token,
            username,
            corrections,
            workspace_root,
            branch,
            message,
            tier,
        } => {
            let mut config = PipelineConfig::from_env();
            if let Some(root) = workspace_root {
                config.workspace_root = root;
            }
            if branch.is_some() {
                config.push_branch = branch;
            }
            if let Some(message) = message {
                config.commit_message = message;
            }
            if let Some(tier) = tier {
                config.model_tier = tier;
            }
            let request = CorrectionRequest::new(
                repo_url,
                file_path,
                Credential::new(token),
                username,
                corrections,
            );
            cmd_fix(config, &request).await
        }
        Commands::Diff { old, new, json } => cmd_diff(&old, &new, json),
    }
}

/// Run the correction pipeline and print its result as JSON.
async fn cmd_fix(config: PipelineConfig, request: &CorrectionRequest) -> Result<()> {
    let llm = Arc::new(
        LlmClient::new(LlmConfig::from_env()).context("Failed to set up the LLM client")?,
    );
    let remote = GitCliClient::new().with_push_branch(config.push_branch.clone());
    let pipeline = CorrectionPipeline::new(
        Arc::new(remote),
        Arc::new(LlmCritic::new(llm.clone())),
        Arc::new(LlmGenerator::new(llm)),
        config,
    );

    info!(
        repo_url = %request.repo_url,
        file = %request.file_path,
        "Starting correction"
    );

    let redactor = Redactor::for_credential(&request.credential);
    let result = pipeline
        .run(request)
        .await
        .map_err(|e| anyhow::anyhow!(redactor.redact(&e.to_string())))
        .context("Correction failed")?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn cmd_diff(old: &Path, new: &Path, json: bool) -> Result<()> {
    let original = std::fs::read_to_string(old)
        .with_context(|| format!("Failed to read file: {:?}", old))?;
    let corrected = std::fs::read_to_string(new)
        .with_context(|| format!("Failed to read file: {:?}", new))?;
    let diff = diff_lines(&original, &corrected);

    if json {
        let output = serde_json::json!({
            "changes": diff.change_count(),
            "summary": ChangeSummary::from_diff(&diff),
            "segments": diff.segments,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", render_diff_text(&diff));
        println!(
            "{} added, {} removed, {} unchanged segment(s)",
            diff.added_count(),
            diff.removed_count(),
            diff.unchanged_count()
        );
    }
    Ok(())
}

/// Render a diff with `+`/`-`/space line prefixes.
fn render_diff_text(diff: &DiffReport) -> String {
    let mut out = String::new();
    for segment in &diff.segments {
        let marker = match segment.kind {
            SegmentKind::Added => '+',
            SegmentKind::Removed => '-',
            SegmentKind::Unchanged => ' ',
        };
        for line in segment.text.lines() {
            out.push(marker);
            out.push(' ');
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}
