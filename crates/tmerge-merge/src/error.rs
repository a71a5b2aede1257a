//! Error types for merge operations.

use std::time::Duration;

use thiserror::Error;

/// Errors that abort a merge. No variant leaves partial output behind.
#[derive(Debug, Error)]
pub enum MergeError {
    /// The strategy selector did not name one of the four strategies.
    #[error("unknown merge strategy: {0} (expected prefer-local, prefer-new, smart or interactive)")]
    UnknownStrategy(String),

    /// An interactive merge was requested without a resolution channel.
    #[error("interactive merge requires a conflict resolver")]
    ResolverRequired,

    /// The resolution channel closed before answering a conflict.
    #[error("conflict resolution abandoned at region {region}")]
    ResolutionAbandoned { region: usize },

    /// No answer arrived within the configured wait.
    #[error("conflict resolution timed out after {timeout:?} at region {region}")]
    ResolutionTimeout { region: usize, timeout: Duration },

    /// The configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error while reading configuration or resolver input.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl MergeError {
    /// Returns `true` for errors raised by the interactive channel.
    pub fn is_abandonment(&self) -> bool {
        matches!(
            self,
            MergeError::ResolutionAbandoned { .. } | MergeError::ResolutionTimeout { .. }
        )
    }
}

/// Convenience type alias for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;
