//! Credential redaction for log and error surfaces.

use crate::domain::Credential;

/// Placeholder substituted for every secret occurrence.
pub const REDACTED: &str = "***";

/// Replaces known secrets in arbitrary text before it is logged or returned.
#[derive(Clone, Default)]
pub struct Redactor {
    secrets: Vec<String>,
}

impl Redactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Redactor for a single credential, raw and percent-encoded.
    pub fn for_credential(credential: &Credential) -> Self {
        let raw = credential.expose();
        Self::new()
            .with_secret(raw)
            .with_secret(urlencoding::encode(raw).into_owned())
    }

    /// Register another secret. Blank values are ignored.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.trim().is_empty() && !self.secrets.contains(&secret) {
            self.secrets.push(secret);
            // Longest first so a secret containing another is replaced whole.
            self.secrets.sort_by_key(|s| std::cmp::Reverse(s.len()));
        }
        self
    }

    pub fn redact(&self, text: &str) -> String {
        let mut out = text.to_string();
        for secret in &self.secrets {
            if out.contains(secret.as_str()) {
                out = out.replace(secret.as_str(), REDACTED);
            }
        }
        out
    }
}

impl std::fmt::Debug for Redactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Redactor")
            .field("secrets", &self.secrets.len())
            .finish()
    }
}
