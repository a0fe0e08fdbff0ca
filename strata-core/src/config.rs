//! Configuration types

use crate::{ConfigError, StrataError, StrataResult};
use serde::{Deserialize, Serialize};

/// Default upper bound on the number of partitions one listing may produce.
pub const DEFAULT_MAX_PARTITIONS: u64 = 1_000_000;

/// Global partition projection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Whether projection is honored at all. When false every call falls
    /// through to the underlying metastore.
    pub enabled: bool,
    /// Largest cartesian product a single listing may enumerate.
    pub max_partitions: u64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_partitions: DEFAULT_MAX_PARTITIONS,
        }
    }
}

impl ProjectionConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `STRATA_PROJECTION_ENABLED`: "true" or "false" (default: true)
    /// - `STRATA_PROJECTION_MAX_PARTITIONS`: partition limit per listing (default: 1000000)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            enabled: std::env::var("STRATA_PROJECTION_ENABLED")
                .ok()
                .map(|s| s.to_lowercase() != "false" && s != "0")
                .unwrap_or(defaults.enabled),
            max_partitions: std::env::var("STRATA_PROJECTION_MAX_PARTITIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_partitions),
        }
    }

    /// Enable or disable projection.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the partition limit.
    pub fn with_max_partitions(mut self, max_partitions: u64) -> Self {
        self.max_partitions = max_partitions;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> StrataResult<()> {
        if self.max_partitions == 0 {
            return Err(StrataError::Config(ConfigError::InvalidValue {
                field: "max_partitions".to_string(),
                value: self.max_partitions.to_string(),
                reason: "max_partitions must be greater than 0".to_string(),
            }));
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
