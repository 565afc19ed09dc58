//! Engine configuration.

use std::path::Path;

use reachframe_cluster::ClusterLevel;
use reachframe_error::{ReachError, Result};
use reachframe_types::limits::DEFAULT_THRESHOLDS;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::frames::validate_thresholds;

pub const ENV_THRESHOLDS: &str = "REACHFRAME_THRESHOLDS";
pub const ENV_CLUSTER_LEVEL: &str = "REACHFRAME_CLUSTER_LEVEL";
pub const ENV_WATCH: &str = "REACHFRAME_WATCH";

/// Knobs for one engine run. Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Adoption thresholds as shares of adjusted total users, strictly
    /// increasing.
    pub thresholds: Vec<f64>,
    /// Features tracked independently of the frame partition.
    pub watch_features: Vec<String>,
    pub cluster_level: ClusterLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            watch_features: Vec::new(),
            cluster_level: ClusterLevel::Full,
        }
    }
}

impl EngineConfig {
    /// # Errors
    ///
    /// [`ReachError::InvalidConfig`] for an empty, non-finite, non-positive
    /// or non-increasing threshold list.
    pub fn validate(&self) -> Result<()> {
        validate_thresholds(&self.thresholds)
    }

    /// Load a JSON config file and validate it.
    ///
    /// # Errors
    ///
    /// I/O errors, [`ReachError::InvalidConfig`] for undecodable or invalid
    /// contents.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| ReachError::config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from the process environment.
    ///
    /// Reads:
    /// - `REACHFRAME_THRESHOLDS`: comma-separated shares, e.g. `0.9,0.99,1`
    /// - `REACHFRAME_CLUSTER_LEVEL`: `major`, `minor` or `full`
    /// - `REACHFRAME_WATCH`: comma-separated feature names
    ///
    /// # Errors
    ///
    /// [`ReachError::InvalidConfig`] for unparseable values.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// [`EngineConfig::apply_env`] over an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`EngineConfig::apply_env`].
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup(ENV_THRESHOLDS) {
            self.thresholds = split_list(&raw)
                .map(|item| {
                    item.parse::<f64>().map_err(|_| {
                        ReachError::config(format!("{ENV_THRESHOLDS}: `{item}` is not a number"))
                    })
                })
                .collect::<Result<_>>()?;
            info!(thresholds = ?self.thresholds, "thresholds overridden from environment");
        }
        if let Some(raw) = lookup(ENV_CLUSTER_LEVEL) {
            self.cluster_level = ClusterLevel::parse(&raw)?;
            info!(level = %self.cluster_level, "cluster level overridden from environment");
        }
        if let Some(raw) = lookup(ENV_WATCH) {
            self.watch_features = split_list(&raw).map(str::to_owned).collect();
        }
        self.validate()
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|item| !item.is_empty())
}
