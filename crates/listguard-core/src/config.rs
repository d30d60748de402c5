//! Centralized configuration for listguard.
//!
//! Constants used as defaults across the crate, plus the serializable
//! [`CoordinatorConfig`] read by [`ListCoordinatorBuilder`](crate::ListCoordinatorBuilder).

use crate::error::{ListError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// List-level defaults.
pub struct ListConfig;

impl ListConfig {
    /// Spool directory used when a request does not name one.
    pub const DEFAULT_SPOOL: &'static str = "/var/spool/mlmmj";
    /// Upper bound on a single delegated executor call.
    pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_LANGUAGE: &'static str = "en";
}

/// Configuration for a [`ListCoordinator`](crate::ListCoordinator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct CoordinatorConfig {
    /// Spool directories scanned for lists on build and on reload.
    pub spools: Vec<String>,
    /// Timeout for each executor call in seconds (0 = no timeout).
    pub operation_timeout_secs: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            spools: vec![ListConfig::DEFAULT_SPOOL.to_string()],
            operation_timeout_secs: ListConfig::DEFAULT_OPERATION_TIMEOUT.as_secs(),
        }
    }
}

impl CoordinatorConfig {
    /// Parse a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CoordinatorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ListError::io_with_path(e, path))?;
        Self::from_json_str(&content)
    }

    /// The per-call timeout, or `None` when disabled.
    pub fn operation_timeout(&self) -> Option<Duration> {
        match self.operation_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    fn validate(&self) -> Result<()> {
        if let Some(spool) = self.spools.iter().find(|s| s.trim().is_empty()) {
            return Err(ListError::Config {
                message: format!("Spool path must not be empty (got {:?})", spool),
            });
        }
        Ok(())
    }
}
