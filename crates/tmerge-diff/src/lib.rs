//! Line diff engine for tmerge.
//!
//! Loads text into [`Document`]s, computes the minimal line-level edit script
//! between a local and a new document, and groups it into positioned
//! [`Hunk`]s with surrounding context.
//!
//! # Key Types
//!
//! - [`Document`] -- Immutable line sequence with its terminator style
//! - [`HunkStream`] / [`Hunk`] / [`DiffLine`] -- Differ output
//! - [`HunkHeader`] -- `@@ -a,b +c,d @@` codec with an all-zero sentinel
//! - [`DiffOptions`] -- Context width and alignment algorithm
//!
//! # Example
//!
//! ```rust
//! use tmerge_diff::{diff_documents, Document};
//!
//! let local = Document::parse("A\nB\nC\n");
//! let new = Document::parse("A\nX\nC\n");
//! let diff = diff_documents(&local, &new);
//! assert_eq!(diff.len(), 1);
//! assert_eq!(diff.hunks[0].header().to_string(), "@@ -1,3 +1,3 @@");
//! ```

pub mod document;
pub mod error;
pub mod header;
pub mod hunk;
pub mod line_diff;

pub use document::{Document, LineEnding};
pub use error::{DiffError, DiffResult};
pub use header::{format_hunk_header, parse_hunk_header, HunkHeader};
pub use hunk::{DiffLine, Hunk, HunkStream};
pub use line_diff::{diff_documents, diff_with, DiffAlgorithm, DiffOptions, DEFAULT_CONTEXT_LINES};
