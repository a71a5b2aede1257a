//! Hunk header codec.
//!
//! Headers follow the unified-diff grammar
//! `@@ -<start1>[,<count1>] +<start2>[,<count2>] @@`, where an omitted count
//! means 1. Anything after the closing `@@` (section names emitted by some
//! tools) is ignored.
//!
//! A header that does not match decodes to [`HunkHeader::UNUSABLE`], the
//! all-zero sentinel. Callers skip positional reasoning for such hunks and
//! carry on with the rest of the diff.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::hunk::Hunk;

static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d*))? \+(\d+)(?:,(\d*))? @@").expect("hunk header pattern is valid")
});

/// Positional part of a hunk: where it sits in both documents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HunkHeader {
    pub local_start: usize,
    pub local_count: usize,
    pub new_start: usize,
    pub new_count: usize,
}

impl HunkHeader {
    /// Sentinel produced for malformed headers.
    pub const UNUSABLE: Self = Self {
        local_start: 0,
        local_count: 0,
        new_start: 0,
        new_count: 0,
    };

    /// Decode a header line, falling back to [`Self::UNUSABLE`].
    pub fn parse(line: &str) -> Self {
        match Self::try_parse(line) {
            Some(header) => header,
            None => {
                warn!(header = line, "malformed hunk header; positions unavailable");
                Self::UNUSABLE
            }
        }
    }

    fn try_parse(line: &str) -> Option<Self> {
        let caps = HEADER_RE.captures(line.trim_end())?;
        let field = |idx: usize| -> Option<usize> {
            match caps.get(idx) {
                Some(m) if !m.as_str().is_empty() => m.as_str().parse().ok(),
                _ => Some(1),
            }
        };
        Some(Self {
            local_start: field(1)?,
            local_count: field(2)?,
            new_start: field(3)?,
            new_count: field(4)?,
        })
    }

    /// Returns `false` for the all-zero sentinel.
    pub fn is_usable(&self) -> bool {
        *self != Self::UNUSABLE
    }

    /// `(local_start, local_count, new_start, new_count)`.
    pub fn as_tuple(&self) -> (usize, usize, usize, usize) {
        (self.local_start, self.local_count, self.new_start, self.new_count)
    }

    /// 0-based index of the first local line covered by the hunk.
    ///
    /// A zero-length side reports the line before the insertion point, so its
    /// start already equals the 0-based offset.
    pub fn local_offset(&self) -> usize {
        offset(self.local_start, self.local_count)
    }

    /// 0-based index of the first new line covered by the hunk.
    pub fn new_offset(&self) -> usize {
        offset(self.new_start, self.new_count)
    }
}

fn offset(start: usize, count: usize) -> usize {
    if count == 0 {
        start
    } else {
        start.saturating_sub(1)
    }
}

impl fmt::Display for HunkHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("@@ -")?;
        write_range(f, self.local_start, self.local_count)?;
        f.write_str(" +")?;
        write_range(f, self.new_start, self.new_count)?;
        f.write_str(" @@")
    }
}

fn write_range(f: &mut fmt::Formatter<'_>, start: usize, count: usize) -> fmt::Result {
    if count == 1 {
        write!(f, "{start}")
    } else {
        write!(f, "{start},{count}")
    }
}

/// Decode a header into its four positional fields.
///
/// Malformed input yields `(0, 0, 0, 0)`.
pub fn parse_hunk_header(line: &str) -> (usize, usize, usize, usize) {
    HunkHeader::parse(line).as_tuple()
}

/// Encode the header of a hunk.
pub fn format_hunk_header(hunk: &Hunk) -> String {
    hunk.header().to_string()
}
