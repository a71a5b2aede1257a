//! Line-level diff: minimal edit script between two documents.
//!
//! Uses the `similar` crate (LCS alignment by default) to produce hunks with
//! a fixed context window. Hunks whose context windows overlap are merged.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffOp, DiffTag};
use tracing::debug;

use crate::document::Document;
use crate::error::DiffError;
use crate::hunk::{DiffLine, Hunk, HunkStream};

/// Unchanged lines kept around each change, as in `diff -u`.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Alignment algorithm used to compute the edit script.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAlgorithm {
    /// Longest common subsequence.
    #[default]
    Lcs,
    /// Myers' O(ND) algorithm.
    Myers,
    /// Patience diff.
    Patience,
}

impl From<DiffAlgorithm> for Algorithm {
    fn from(value: DiffAlgorithm) -> Self {
        match value {
            DiffAlgorithm::Lcs => Algorithm::Lcs,
            DiffAlgorithm::Myers => Algorithm::Myers,
            DiffAlgorithm::Patience => Algorithm::Patience,
        }
    }
}

impl FromStr for DiffAlgorithm {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lcs" => Ok(DiffAlgorithm::Lcs),
            "myers" => Ok(DiffAlgorithm::Myers),
            "patience" => Ok(DiffAlgorithm::Patience),
            _ => Err(DiffError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Tunables for [`diff_with`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// Unchanged lines around each change.
    pub context_lines: usize,
    /// Alignment algorithm.
    pub algorithm: DiffAlgorithm,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
            algorithm: DiffAlgorithm::default(),
        }
    }
}

/// Diff two documents with default options.
pub fn diff_documents(local: &Document, new: &Document) -> HunkStream {
    diff_with(local, new, &DiffOptions::default())
}

/// Diff two documents.
///
/// Line-identical documents produce an empty stream. Either side may be
/// empty, in which case the result is a single one-sided hunk.
pub fn diff_with(local: &Document, new: &Document, options: &DiffOptions) -> HunkStream {
    if local.same_lines(new) {
        return HunkStream::default();
    }

    let ops = similar::capture_diff_slices(options.algorithm.into(), local.lines(), new.lines());
    let hunks: Vec<Hunk> = similar::group_diff_ops(ops, options.context_lines)
        .iter()
        .map(|group| build_hunk(group, local, new))
        .collect();

    debug!(
        hunks = hunks.len(),
        local_lines = local.len(),
        new_lines = new.len(),
        algorithm = ?options.algorithm,
        "computed line diff"
    );
    HunkStream::new(hunks)
}

/// Flatten one group of diff ops into a hunk, removals before additions.
fn build_hunk(group: &[DiffOp], local: &Document, new: &Document) -> Hunk {
    let local_begin = group.first().map_or(0, |op| op.old_range().start);
    let new_begin = group.first().map_or(0, |op| op.new_range().start);

    let mut lines = Vec::new();
    let mut local_count = 0usize;
    let mut new_count = 0usize;

    for op in group {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                for line in &local.lines()[old_range] {
                    lines.push(DiffLine::Context(line.clone()));
                    local_count += 1;
                    new_count += 1;
                }
            }
            DiffTag::Delete => {
                for line in &local.lines()[old_range] {
                    lines.push(DiffLine::Removed(line.clone()));
                    local_count += 1;
                }
            }
            DiffTag::Insert => {
                for line in &new.lines()[new_range] {
                    lines.push(DiffLine::Added(line.clone()));
                    new_count += 1;
                }
            }
            DiffTag::Replace => {
                for line in &local.lines()[old_range] {
                    lines.push(DiffLine::Removed(line.clone()));
                    local_count += 1;
                }
                for line in &new.lines()[new_range] {
                    lines.push(DiffLine::Added(line.clone()));
                    new_count += 1;
                }
            }
        }
    }

    Hunk {
        local_start: unified_start(local_begin, local_count),
        local_count,
        new_start: unified_start(new_begin, new_count),
        new_count,
        lines,
    }
}

/// 1-based start; a zero-length side reports the line before the insertion.
fn unified_start(offset: usize, count: usize) -> usize {
    if count == 0 {
        offset
    } else {
        offset + 1
    }
}
