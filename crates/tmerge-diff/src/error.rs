//! Error types for the diff crate.

/// Errors that can occur while loading documents or configuring a diff.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// The input bytes are not UTF-8 text. Binary content is not diffed.
    #[error("content is not valid UTF-8 text ({len} bytes)")]
    Binary { len: usize },

    /// An algorithm name did not match any supported diff algorithm.
    #[error("unknown diff algorithm: {0}")]
    UnknownAlgorithm(String),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
