//! Hunks and hunk streams.
//!
//! A [`HunkStream`] is the differ's output: positioned hunks in ascending
//! order, each holding prefixed lines (`' '` context, `'-'` local-only,
//! `'+'` new-only). The stream renders to, and reads back from, the unified
//! diff text format.

use serde::{Deserialize, Serialize};

use crate::header::HunkHeader;

/// A single line in a hunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum DiffLine {
    /// A line present in both documents.
    Context(String),
    /// A line only present in the local document.
    Removed(String),
    /// A line only present in the new document.
    Added(String),
}

impl DiffLine {
    /// The unified-diff prefix character.
    pub fn prefix(&self) -> char {
        match self {
            DiffLine::Context(_) => ' ',
            DiffLine::Removed(_) => '-',
            DiffLine::Added(_) => '+',
        }
    }

    /// The line content without prefix.
    pub fn text(&self) -> &str {
        match self {
            DiffLine::Context(s) | DiffLine::Removed(s) | DiffLine::Added(s) => s,
        }
    }

    /// Decode a prefixed line. A bare empty line counts as empty context,
    /// since some tools strip the trailing space of blank context lines.
    pub fn from_prefixed(line: &str) -> Option<Self> {
        let mut chars = line.chars();
        match chars.next() {
            None => Some(DiffLine::Context(String::new())),
            Some(' ') => Some(DiffLine::Context(chars.as_str().to_owned())),
            Some('-') => Some(DiffLine::Removed(chars.as_str().to_owned())),
            Some('+') => Some(DiffLine::Added(chars.as_str().to_owned())),
            Some(_) => None,
        }
    }
}

/// A contiguous region where the two documents disagree, with context.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    /// Line number in the local document where this hunk starts (1-based).
    pub local_start: usize,
    /// Number of local lines (context + removed) in this hunk.
    pub local_count: usize,
    /// Line number in the new document where this hunk starts (1-based).
    pub new_start: usize,
    /// Number of new lines (context + added) in this hunk.
    pub new_count: usize,
    /// The individual diff lines in document order.
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// An empty hunk positioned by `header`.
    pub fn with_header(header: HunkHeader) -> Self {
        Self {
            local_start: header.local_start,
            local_count: header.local_count,
            new_start: header.new_start,
            new_count: header.new_count,
            lines: Vec::new(),
        }
    }

    /// The positional header of this hunk.
    pub fn header(&self) -> HunkHeader {
        HunkHeader {
            local_start: self.local_start,
            local_count: self.local_count,
            new_start: self.new_start,
            new_count: self.new_count,
        }
    }

    /// Number of new-only lines.
    pub fn additions(&self) -> usize {
        self.lines.iter().filter(|l| matches!(l, DiffLine::Added(_))).count()
    }

    /// Number of local-only lines.
    pub fn deletions(&self) -> usize {
        self.lines.iter().filter(|l| matches!(l, DiffLine::Removed(_))).count()
    }

    /// Returns `true` if the header counts agree with the lines.
    pub fn is_consistent(&self) -> bool {
        let context = self.lines.len() - self.additions() - self.deletions();
        self.local_count == context + self.deletions() && self.new_count == context + self.additions()
    }
}

/// Ordered, non-overlapping hunks describing how `local` becomes `new`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkStream {
    pub hunks: Vec<Hunk>,
}

impl HunkStream {
    /// Wrap already-ordered hunks.
    pub fn new(hunks: Vec<Hunk>) -> Self {
        Self { hunks }
    }

    /// Returns `true` if the documents were line-identical.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Number of hunks.
    pub fn len(&self) -> usize {
        self.hunks.len()
    }

    /// Iterate over hunks in position order.
    pub fn iter(&self) -> std::slice::Iter<'_, Hunk> {
        self.hunks.iter()
    }

    /// Total number of new-only lines across all hunks.
    pub fn additions(&self) -> usize {
        self.hunks.iter().map(Hunk::additions).sum()
    }

    /// Total number of local-only lines across all hunks.
    pub fn deletions(&self) -> usize {
        self.hunks.iter().map(Hunk::deletions).sum()
    }

    /// Render as unified diff text with `---`/`+++` file labels.
    ///
    /// An empty stream renders as the empty string.
    pub fn to_unified(&self, from_label: &str, to_label: &str) -> String {
        if self.is_empty() {
            return String::new();
        }
        let mut out = format!("--- {from_label}\n+++ {to_label}\n");
        for hunk in &self.hunks {
            out.push_str(&hunk.header().to_string());
            out.push('\n');
            for line in &hunk.lines {
                out.push(line.prefix());
                out.push_str(line.text());
                out.push('\n');
            }
        }
        out
    }

    /// Read unified diff text back into hunks.
    ///
    /// File label lines and anything before the first `@@` are skipped.
    /// A malformed header still opens a hunk, positioned at the all-zero
    /// sentinel; its lines are collected up to the next `@@`.
    pub fn parse_unified(text: &str) -> Self {
        let mut hunks: Vec<Hunk> = Vec::new();
        // (local, new) lines still expected by the current hunk's header.
        let mut remaining: Option<(usize, usize)> = None;

        for raw in text.lines() {
            if raw.starts_with("@@") {
                let header = HunkHeader::parse(raw);
                remaining = header
                    .is_usable()
                    .then_some((header.local_count, header.new_count));
                hunks.push(Hunk::with_header(header));
                continue;
            }
            let Some(hunk) = hunks.last_mut() else {
                continue;
            };
            if remaining == Some((0, 0)) {
                continue;
            }
            let Some(line) = DiffLine::from_prefixed(raw) else {
                continue;
            };
            if let Some((local, new)) = remaining.as_mut() {
                match &line {
                    DiffLine::Context(_) => {
                        *local = local.saturating_sub(1);
                        *new = new.saturating_sub(1);
                    }
                    DiffLine::Removed(_) => *local = local.saturating_sub(1),
                    DiffLine::Added(_) => *new = new.saturating_sub(1),
                }
            }
            hunk.lines.push(line);
        }

        Self { hunks }
    }
}

impl<'a> IntoIterator for &'a HunkStream {
    type Item = &'a Hunk;
    type IntoIter = std::slice::Iter<'a, Hunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.hunks.iter()
    }
}
