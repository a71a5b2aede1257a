//! Two-way text merge engine for tmerge.
//!
//! Compares a local document against a new one, flattens the line diff into
//! origin-tagged records, and produces a merged document under one of four
//! strategies. The interactive strategy hands each conflict region to a
//! [`ConflictResolver`] and blocks until it answers.
//!
//! # Key Types
//!
//! - [`MergeEngine`] -- Diff, build and apply in one call
//! - [`MergeStrategy`] -- `prefer-local`, `prefer-new`, `smart`, `interactive`
//! - [`MergeRecord`] / [`Origin`] -- One attributed line of the diff
//! - [`ConflictRegion`] -- Maximal run of non-shared records
//! - [`SemanticBlock`] -- Heuristic structural block used by `smart`
//! - [`MergeConfig`] -- TOML-loadable engine settings
//!
//! # Quick Start
//!
//! ```rust
//! use tmerge_diff::Document;
//! use tmerge_merge::{MergeEngine, MergeStrategy};
//!
//! let engine = MergeEngine::default();
//! let local = Document::parse("A\nB\nC\n");
//! let new = Document::parse("A\nX\nC\n");
//!
//! let outcome = engine.merge(&local, &new, MergeStrategy::PreferNew).unwrap();
//! assert_eq!(outcome.text, "A\nX\nC\n");
//!
//! let outcome = engine.merge(&local, &new, MergeStrategy::Smart).unwrap();
//! assert_eq!(outcome.text, "A\nB\nX\nC\n");
//! ```

pub mod builder;
pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod record;
pub mod resolver;
pub mod semantic;
pub mod strategy;

// Re-exports for convenience.
pub use builder::{build, build_spliced};
pub use config::{MergeConfig, SmartPolicy};
pub use conflict::{conflict_regions, group, ConflictRegion, Segment};
pub use engine::{MergeEngine, MergeOutcome, MergeStatus, LOCAL_LABEL, NEW_LABEL};
pub use error::{MergeError, Result};
pub use record::{MergeRecord, Origin};
pub use resolver::{
    channel, read_replacement, ChannelResolver, Choice, ConflictRequest, ConflictResolver,
    Resolution, ResolutionHandle, ScriptedResolver, DEFAULT_END_SENTINEL,
};
pub use semantic::{BlockComparison, BlockKind, BlockMap, SemanticBlock};
pub use strategy::MergeStrategy;
