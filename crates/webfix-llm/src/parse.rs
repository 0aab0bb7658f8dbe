//! Turning raw completions into typed values.

use serde::Deserialize;
use webfix_core::{CritiqueResult, Finding, ServiceError};

/// Characters of a response kept in an error message.
pub(crate) const ERROR_BODY_CHARS: usize = 200;

/// Strip a surrounding markdown code fence, with or without a language tag.
pub fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, `html`, ...) on the opening line.
    let body = match rest.find('\n') {
        Some(idx) if !rest[..idx].contains(char::is_whitespace) => &rest[idx + 1..],
        _ => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Slice from the first `open` to the last `close`.
fn extract_json_fragment(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if start <= end {
        Some(&text[start..=end])
    } else {
        None
    }
}

#[derive(Deserialize)]
struct RawCritique {
    #[serde(default, alias = "findings")]
    fixes: Vec<RawFix>,
    #[serde(default)]
    score: f64,
}

#[derive(Deserialize)]
struct RawFix {
    description: String,
    #[serde(default)]
    category: String,
}

/// Parse a critique completion of the form
/// `{"fixes": [{"description", "category"}], "score"}`.
pub fn parse_critique(response: &str) -> Result<CritiqueResult, ServiceError> {
    let clean = strip_markdown_fences(response);
    let json = extract_json_fragment(clean, '{', '}').ok_or_else(|| {
        ServiceError::InvalidResponse(format!(
            "no JSON object in critique: {}",
            truncate_str(clean, ERROR_BODY_CHARS)
        ))
    })?;
    let raw: RawCritique = serde_json::from_str(json).map_err(|e| {
        ServiceError::InvalidResponse(format!("malformed critique JSON: {e}"))
    })?;

    Ok(CritiqueResult {
        findings: raw
            .fixes
            .into_iter()
            .map(|f| Finding::new(f.description, f.category))
            .collect(),
        score: raw.score,
    })
}

/// Extract the corrected document from a generation completion.
///
/// Any text is accepted. Unfenced completions, blank ones included, are
/// returned verbatim. A fenced one yields its body with a single trailing
/// newline.
pub fn parse_generated(response: &str) -> String {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return response.to_string();
    }
    let body = strip_markdown_fences(trimmed);
    if body.is_empty() {
        return String::new();
    }
    format!("{body}\n")
}

/// Truncate a string for display (Unicode-safe).
pub(crate) fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
