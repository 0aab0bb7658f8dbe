//! Process-wide log setup for the `webfix` binary.
//!
//! Records go to stderr so stdout carries only the command result.
//! `RUST_LOG` overrides the default filter, which holds HTTP client
//! internals at `warn`.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Output format for log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    /// Newline-delimited JSON.
    Json,
}

/// Filter used when `RUST_LOG` is unset.
fn default_directives(level: Level) -> String {
    format!(
        "{},hyper=warn,hyper_util=warn,h2=warn,reqwest=warn,rustls=warn",
        level.as_str()
    )
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed; the first one
/// stays in effect.
pub fn init_tracing(format: LogFormat, level: Level) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let registry = tracing_subscriber::registry().with(filter);
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    match format {
        LogFormat::Text => registry.with(layer).try_init(),
        LogFormat::Json => registry.with(layer.json()).try_init(),
    }
    .is_ok()
}
