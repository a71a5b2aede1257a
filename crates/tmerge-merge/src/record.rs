//! Tagged line records: the flattened form of a hunk stream.

use serde::{Deserialize, Serialize};

/// Which document a record's line comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Only in the local document.
    Local,
    /// Only in the new document.
    New,
    /// Shared by both documents.
    Both,
}

/// One line of the diff, attributed to its origin.
///
/// Record order equals diff emission order; strategies rely on it to
/// reconstruct output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRecord {
    pub content: String,
    pub origin: Origin,
    /// 1-based line in the local document, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_line: Option<usize>,
    /// 1-based line in the new document, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_line: Option<usize>,
}

impl MergeRecord {
    /// A record without positional information.
    pub fn new(content: impl Into<String>, origin: Origin) -> Self {
        Self {
            content: content.into(),
            origin,
            local_line: None,
            new_line: None,
        }
    }

    /// Shorthand for a local-only record.
    pub fn local(content: impl Into<String>) -> Self {
        Self::new(content, Origin::Local)
    }

    /// Shorthand for a new-only record.
    pub fn new_only(content: impl Into<String>) -> Self {
        Self::new(content, Origin::New)
    }

    /// Shorthand for a shared record.
    pub fn both(content: impl Into<String>) -> Self {
        Self::new(content, Origin::Both)
    }

    /// Attach document positions.
    pub fn at(mut self, local_line: Option<usize>, new_line: Option<usize>) -> Self {
        self.local_line = local_line;
        self.new_line = new_line;
        self
    }

    /// Returns `true` for shared records.
    pub fn is_shared(&self) -> bool {
        self.origin == Origin::Both
    }
}
