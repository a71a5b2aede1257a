//! Merge strategy selector.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MergeError;

/// Policy deciding which side survives where the documents disagree.
///
/// Selected once per merge call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Keep local and shared lines; drop new-only lines.
    PreferLocal,
    /// Keep new and shared lines; drop local-only lines.
    PreferNew,
    /// Non-destructive union, optionally biased by semantic blocks.
    #[default]
    Smart,
    /// Ask a resolver for every conflict region.
    Interactive,
}

impl MergeStrategy {
    /// All strategies, in menu order.
    pub const ALL: [MergeStrategy; 4] = [
        MergeStrategy::PreferLocal,
        MergeStrategy::PreferNew,
        MergeStrategy::Smart,
        MergeStrategy::Interactive,
    ];

    /// The selector string for this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::PreferLocal => "prefer-local",
            MergeStrategy::PreferNew => "prefer-new",
            MergeStrategy::Smart => "smart",
            MergeStrategy::Interactive => "interactive",
        }
    }

    /// Returns `true` if the strategy needs a resolution channel.
    pub fn is_interactive(&self) -> bool {
        matches!(self, MergeStrategy::Interactive)
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| MergeError::UnknownStrategy(s.to_string()))
    }
}
