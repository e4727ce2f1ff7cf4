//! TOML configuration file.
//!
//! ```toml
//! [gateway]
//! base_url = "http://localhost:8000"
//! timeout_secs = 30
//!
//! [review]
//! threshold = 0.7
//! drop_stale = false
//! ```
//!
//! Every key is optional. Command-line flags take precedence.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use ssm_gateway::GatewaySettings;
use ssm_model::Threshold;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewaySettings,
    pub review: ReviewSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSettings {
    pub threshold: Threshold,
    pub drop_stale: bool,
}

impl AppConfig {
    /// Load the config from `path`. Unlike missing keys, a missing file is
    /// an error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("parse config {}", path.display()))?;
        config.review.threshold = Threshold::clamped(config.review.threshold.value());
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Load `path` when given, otherwise the defaults.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides on top of the file values.
    pub fn apply_overrides(
        &mut self,
        base_url: Option<&str>,
        threshold: Option<f64>,
        drop_stale: bool,
    ) {
        if let Some(base_url) = base_url {
            self.gateway.base_url = base_url.to_string();
        }
        if let Some(threshold) = threshold {
            self.review.threshold = Threshold::clamped(threshold);
        }
        self.review.drop_stale |= drop_stale;
    }
}
