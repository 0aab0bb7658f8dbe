//! Line-level diff between original and corrected content.
//!
//! Lines are aligned with Myers' algorithm (via `similar`, linear space),
//! then consecutive lines of the same classification are coalesced into
//! segments. Within a changed region removals precede additions. Lines keep
//! their terminators, so concatenating the unchanged and added segments
//! yields the corrected text exactly.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};

/// Classification of a diff segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Added,
    Removed,
    Unchanged,
}

/// A contiguous run of lines sharing one classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSegment {
    pub kind: SegmentKind,
    pub text: String,
}

impl DiffSegment {
    pub fn is_change(&self) -> bool {
        self.kind != SegmentKind::Unchanged
    }
}

/// Ordered diff of two texts. Observational only, never re-applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffReport {
    pub segments: Vec<DiffSegment>,
}

impl DiffReport {
    fn count(&self, kind: SegmentKind) -> usize {
        self.segments.iter().filter(|s| s.kind == kind).count()
    }

    pub fn added_count(&self) -> usize {
        self.count(SegmentKind::Added)
    }

    pub fn removed_count(&self) -> usize {
        self.count(SegmentKind::Removed)
    }

    pub fn unchanged_count(&self) -> usize {
        self.count(SegmentKind::Unchanged)
    }

    /// Total number of segments, unchanged included.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Number of added plus removed segments.
    pub fn change_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_change()).count()
    }

    pub fn is_identical(&self) -> bool {
        self.change_count() == 0
    }
}

/// Upper bound on alignment work; past it the diff is still valid but may
/// not be minimal.
const DIFF_TIMEOUT: Duration = Duration::from_secs(5);

/// Pending removals and additions between two unchanged lines.
#[derive(Default)]
struct Hunk {
    removed: String,
    added: String,
}

impl Hunk {
    fn flush(&mut self, segments: &mut Vec<DiffSegment>) {
        for (kind, text) in [
            (SegmentKind::Removed, &mut self.removed),
            (SegmentKind::Added, &mut self.added),
        ] {
            if !text.is_empty() {
                segments.push(DiffSegment {
                    kind,
                    text: std::mem::take(text),
                });
            }
        }
    }
}

/// Diff `original` against `corrected`, line by line.
pub fn diff_lines(original: &str, corrected: &str) -> DiffReport {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .timeout(DIFF_TIMEOUT)
        .diff_lines(original, corrected);

    let mut segments: Vec<DiffSegment> = Vec::new();
    let mut hunk = Hunk::default();

    for change in diff.iter_all_changes() {
        let line = change.value();
        match change.tag() {
            ChangeTag::Delete => hunk.removed.push_str(line),
            ChangeTag::Insert => hunk.added.push_str(line),
            ChangeTag::Equal => {
                hunk.flush(&mut segments);
                match segments.last_mut() {
                    Some(last) if last.kind == SegmentKind::Unchanged => last.text.push_str(line),
                    _ => segments.push(DiffSegment {
                        kind: SegmentKind::Unchanged,
                        text: line.to_string(),
                    }),
                }
            }
        }
    }
    hunk.flush(&mut segments);

    DiffReport { segments }
}
