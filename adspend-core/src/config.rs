//! Pipeline configuration

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::abtest::AbTestConfig;
use crate::attribution::AttributionConfig;
use crate::error::Result;
use crate::journey::JourneyConfig;
use crate::metrics::MetricsConfig;
use crate::optimize::OptimizerConfig;

/// Every tunable of a pipeline run, one section per stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub journey: JourneyConfig,
    pub attribution: AttributionConfig,
    pub metrics: MetricsConfig,
    pub optimizer: OptimizerConfig,
    pub abtest: AbTestConfig,
}

impl PipelineConfig {
    /// Parse from TOML; missing sections and fields take their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// SHA-256 hex digest of the canonical JSON form.
    ///
    /// Identifies the configuration version in derived table keys; equal
    /// configurations always produce the same fingerprint.
    pub fn fingerprint(&self) -> Result<String> {
        let canonical = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        Ok(hex::encode(hasher.finalize()))
    }
}
