//! Module configuration

use crate::{GroupError, GroupResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Governance limits supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// How long after the voting period ends an accepted proposal may still
    /// be executed before it is pruned.
    pub max_execution_period_secs: u64,

    /// Maximum length of any metadata field.
    pub max_metadata_len: usize,

    /// Maximum length of a proposal title.
    pub max_proposal_title_len: usize,

    /// Maximum length of a proposal summary.
    pub max_proposal_summary_len: usize,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            max_execution_period_secs: 14 * 24 * 60 * 60,
            max_metadata_len: 255,
            max_proposal_title_len: 255,
            max_proposal_summary_len: 10_200,
        }
    }
}

impl GroupConfig {
    pub fn max_execution_period(&self) -> Duration {
        Duration::from_secs(self.max_execution_period_secs)
    }

    /// Parse configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> GroupResult<Self> {
        toml::from_str(contents).map_err(|e| GroupError::Config(e.to_string()))
    }

    /// Load configuration from file, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: impl AsRef<Path>) -> GroupResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(GroupConfig::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GroupError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }
}
