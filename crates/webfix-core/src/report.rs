//! Caller-facing result and the change summary written to the operation log.

use serde::{Deserialize, Serialize};

use crate::diff::{DiffReport, SegmentKind};

/// Characters of each segment kept in a log preview.
const PREVIEW_CHARS: usize = 50;

/// Terminal success result of one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub success: bool,
    /// Added plus removed diff segments.
    pub changes: usize,
}

impl PipelineResult {
    pub fn from_diff(diff: &DiffReport) -> Self {
        Self {
            success: true,
            changes: diff.change_count(),
        }
    }
}

/// Truncated view of one diff segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentPreview {
    pub kind: SegmentKind,
    pub preview: String,
}

/// Counts and previews of a diff, for observability only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub segments: usize,
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub previews: Vec<SegmentPreview>,
}

impl ChangeSummary {
    pub fn from_diff(diff: &DiffReport) -> Self {
        Self {
            segments: diff.segment_count(),
            added: diff.added_count(),
            removed: diff.removed_count(),
            unchanged: diff.unchanged_count(),
            previews: diff
                .segments
                .iter()
                .map(|s| SegmentPreview {
                    kind: s.kind,
                    preview: preview(&s.text),
                })
                .collect(),
        }
    }
}

fn preview(text: &str) -> String {
    let mut out: String = text.chars().take(PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_lines;

    #[test]
    fn test_result_serializes_to_success_and_changes() {
        let result = PipelineResult::from_diff(&diff_lines("<p>Hi</p>", "<p>Hello</p>"));
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "changes": 2}));
    }

    #[test]
    fn test_unchanged_segments_are_not_changes() {
        let diff = diff_lines("a\nb\nc\n", "a\nB\nc\n");
        assert_eq!(diff.segment_count(), 4);
        assert_eq!(PipelineResult::from_diff(&diff).changes, 2);
    }

    #[test]
    fn test_summary_counts_and_truncates() {
        let long = format!("{}\n", "x".repeat(80));
        let diff = diff_lines("keep\n", &format!("keep\n{long}"));
        let summary = ChangeSummary::from_diff(&diff);

        assert_eq!(summary.segments, 2);
        assert_eq!(summary.added, 1);
        assert_eq!(summary.removed, 0);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.previews[1].preview.chars().count(), PREVIEW_CHARS + 3);
        assert!(summary.previews[1].preview.ends_with("..."));
    }
}
