use serde::{Deserialize, Serialize};

use crate::error::{TrackerError, TrackerResult};

/// Per-tracker configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Suffix used to derive the value and timestamp keys.
    pub suffix: String,
    /// Back the tracker with cached objects (`true`) or isolated ones.
    pub use_cache: bool,
}

impl TrackerConfig {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
            ..Self::default()
        }
    }

    /// Use isolated objects: every access goes to the store.
    pub fn isolated(mut self) -> Self {
        self.use_cache = false;
        self
    }

    /// Key holding the tracked value: `<key>_<suffix>`.
    pub fn value_key(&self, key: &str) -> String {
        format!("{key}_{}", self.suffix)
    }

    /// Key holding the last-update timestamp: `<key>_last_<suffix>`.
    pub fn last_update_key(&self, key: &str) -> String {
        format!("{key}_last_{}", self.suffix)
    }

    pub(crate) fn validate(&self, key: &str) -> TrackerResult<()> {
        if key.is_empty() {
            return Err(TrackerError::InvalidConfig("key must not be empty".into()));
        }
        if self.suffix.is_empty() {
            return Err(TrackerError::InvalidConfig("suffix must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            suffix: "tracker".into(),
            use_cache: true,
        }
    }
}
