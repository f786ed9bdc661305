//! Configuration for sequin
//!
//! A single JSON document configures the rolling scanner and the default
//! builder parameters. Every field is optional.

use crate::builder::BuilderOptions;
use crate::common::error::SequinResult;
use crate::execution::RollingConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequinConfig {
    pub rolling: RollingConfig,
    pub builder: BuilderOptions,
}

impl SequinConfig {
    /// Parse a configuration from a JSON string
    pub fn from_json_str(json: &str) -> SequinResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> SequinResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&contents)?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_string(&self) -> SequinResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
