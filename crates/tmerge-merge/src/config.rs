use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tmerge_diff::DiffOptions;

use crate::error::{MergeError, Result};
use crate::resolver::DEFAULT_END_SENTINEL;
use crate::strategy::MergeStrategy;

/// Configuration for the merge engine.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Strategy used when the caller does not pick one.
    pub default_strategy: MergeStrategy,
    /// Maximum wait for one interactive decision. `None` waits forever.
    pub resolution_timeout_secs: Option<u64>,
    /// Line terminating a freeform replacement.
    pub end_sentinel: String,
    /// Differ tunables.
    pub diff: DiffOptions,
    /// Smart strategy policy.
    pub smart: SmartPolicy,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            default_strategy: MergeStrategy::default(),
            resolution_timeout_secs: None,
            end_sentinel: DEFAULT_END_SENTINEL.to_string(),
            diff: DiffOptions::default(),
            smart: SmartPolicy::default(),
        }
    }
}

impl MergeConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| MergeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| MergeError::Config(e.to_string()))
    }

    /// The interactive wait limit, if any.
    pub fn resolution_timeout(&self) -> Option<Duration> {
        self.resolution_timeout_secs.map(Duration::from_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.end_sentinel.is_empty() || self.end_sentinel.contains(['\n', '\r']) {
            return Err(MergeError::Config(
                "end_sentinel must be a non-empty single line".to_string(),
            ));
        }
        if self.resolution_timeout_secs == Some(0) {
            return Err(MergeError::Config(
                "resolution_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tunables for the smart strategy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmartPolicy {
    /// Let a wholesale rewrite of a named declaration replace the local
    /// version instead of keeping both.
    pub block_replacement: bool,
}
