//! Capability-database query contract and a static, snapshot-backed
//! implementation.
//!
//! The contract is read-only and CPU-only: implementations are shared across
//! runs behind `&dyn CapabilityDatabase`.
//!
//! # Resolution policy
//!
//! For one (browser, feature) pair the database holds a table of version
//! ranges, each with a support flag. A version resolves to the flag of the
//! range that contains it. A version above every listed range inherits the
//! flag of the highest range (by upper bound) only when that flag is
//! "supported"; anything else, including versions in gaps or below the
//! first range, is unsupported.

use std::collections::BTreeMap;
use std::path::Path;

use reachframe_error::{ReachError, Result};
use reachframe_types::limits::SUPPORTED_FLAG_PREFIX;
use reachframe_types::{FeatureSet, Version, VersionRange};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Read-only queries the engine makes against capability data.
pub trait CapabilityDatabase: Send + Sync {
    /// Known release versions of `browser`, ascending and duplicate-free.
    ///
    /// # Errors
    ///
    /// [`ReachError::UnknownBrowserId`] if the browser is not in the database.
    fn known_versions(&self, browser: &str) -> Result<Vec<Version>>;

    /// Whether `browser` at `version` supports `feature`.
    ///
    /// # Errors
    ///
    /// [`ReachError::UnknownBrowserId`] or [`ReachError::UnknownFeatureName`].
    fn supports(&self, browser: &str, version: &Version, feature: &str) -> Result<bool>;

    /// Every feature name in the database.
    fn feature_names(&self) -> FeatureSet;

    /// Human-readable title of a feature.
    fn feature_title(&self, feature: &str) -> Option<&str>;

    /// Whether the database knows `feature`.
    fn has_feature(&self, feature: &str) -> bool {
        self.feature_title(feature).is_some()
    }

    /// All features `browser` at `version` supports.
    ///
    /// # Errors
    ///
    /// [`ReachError::UnknownBrowserId`] if the browser is not in the database.
    fn features_of(&self, browser: &str, version: &Version) -> Result<FeatureSet> {
        let mut result = FeatureSet::new();
        for name in self.feature_names() {
            if self.supports(browser, version, &name)? {
                result.insert(name);
            }
        }
        Ok(result)
    }

    /// Feature name to title, for every feature.
    fn feature_titles(&self) -> BTreeMap<String, String> {
        self.feature_names()
            .into_iter()
            .filter_map(|name| {
                let title = self.feature_title(&name)?.to_owned();
                Some((name, title))
            })
            .collect()
    }
}

// ── Snapshot format ──────────────────────────────────────────────────────

/// One browser in a capability snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Display name, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browser: Option<String>,
    /// Release versions or version ranges; `null` entries are placeholders.
    #[serde(default)]
    pub versions: Vec<Option<String>>,
}

/// One feature in a capability snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    #[serde(default)]
    pub title: String,
    /// browser id -> version range -> support flag (`y`, `n`, `a x #2`, ...).
    #[serde(default)]
    pub stats: BTreeMap<String, BTreeMap<String, String>>,
}

/// Serialized capability data, shaped like the public caniuse agent and
/// feature tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilitySnapshot {
    #[serde(default)]
    pub agents: BTreeMap<String, AgentSnapshot>,
    #[serde(default)]
    pub features: BTreeMap<String, FeatureSnapshot>,
}

// ── Static database ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct SupportRange {
    range: VersionRange,
    supported: bool,
}

#[derive(Debug, Clone)]
struct FeatureEntry {
    title: String,
    /// Per browser, sorted ascending by range ceiling.
    support: BTreeMap<String, Vec<SupportRange>>,
}

/// In-memory capability database built once from a [`CapabilitySnapshot`].
#[derive(Debug, Clone, Default)]
pub struct StaticCapabilityDb {
    agents: BTreeMap<String, Vec<Version>>,
    features: BTreeMap<String, FeatureEntry>,
}

impl StaticCapabilityDb {
    /// Index a snapshot. Version keys that are not ranges (`TP`, `all`) are
    /// skipped.
    pub fn from_snapshot(snapshot: CapabilitySnapshot) -> Self {
        let mut agents = BTreeMap::new();
        for (id, agent) in snapshot.agents {
            let mut versions: Vec<Version> = agent
                .versions
                .iter()
                .flatten()
                .filter_map(|text| parse_range_key(&id, text))
                .map(|range| range.floor())
                .collect();
            versions.sort();
            versions.dedup();
            agents.insert(id, versions);
        }

        let mut features = BTreeMap::new();
        for (name, feature) in snapshot.features {
            let mut support = BTreeMap::new();
            for (browser, flags) in feature.stats {
                let mut ranges: Vec<SupportRange> = flags
                    .iter()
                    .filter_map(|(key, flag)| {
                        parse_range_key(&browser, key).map(|range| SupportRange {
                            range,
                            supported: flag.starts_with(SUPPORTED_FLAG_PREFIX),
                        })
                    })
                    .collect();
                ranges.sort_by_cached_key(|entry| entry.range.ceiling());
                support.insert(browser, ranges);
            }
            features.insert(
                name,
                FeatureEntry {
                    title: feature.title,
                    support,
                },
            );
        }

        info!(
            agents = agents.len(),
            features = features.len(),
            "capability database indexed"
        );
        Self { agents, features }
    }

    /// Decode and index a JSON snapshot.
    ///
    /// # Errors
    ///
    /// [`ReachError::InvalidCapabilityData`] if the JSON does not decode.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let snapshot: CapabilitySnapshot =
            serde_json::from_str(json).map_err(|e| ReachError::InvalidCapabilityData {
                detail: e.to_string(),
            })?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Read, decode and index a JSON snapshot file.
    ///
    /// # Errors
    ///
    /// I/O errors, or [`ReachError::InvalidCapabilityData`].
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    fn ensure_browser(&self, browser: &str) -> Result<()> {
        if self.agents.contains_key(browser) {
            Ok(())
        } else {
            Err(ReachError::UnknownBrowserId {
                id: browser.to_owned(),
            })
        }
    }
}

fn parse_range_key(browser: &str, key: &str) -> Option<VersionRange> {
    match VersionRange::parse(key) {
        Ok(range) => Some(range),
        Err(error) => {
            debug!(browser, key, %error, "skipping non-version capability key");
            None
        }
    }
}

fn resolve(ranges: &[SupportRange], version: &Version) -> bool {
    if let Some(hit) = ranges.iter().find(|entry| entry.range.contains(version)) {
        return hit.supported;
    }
    ranges
        .last()
        .is_some_and(|top| top.supported && top.range.is_below(version))
}

impl CapabilityDatabase for StaticCapabilityDb {
    fn known_versions(&self, browser: &str) -> Result<Vec<Version>> {
        self.agents
            .get(browser)
            .cloned()
            .ok_or_else(|| ReachError::UnknownBrowserId {
                id: browser.to_owned(),
            })
    }

    fn supports(&self, browser: &str, version: &Version, feature: &str) -> Result<bool> {
        self.ensure_browser(browser)?;
        let entry = self
            .features
            .get(feature)
            .ok_or_else(|| ReachError::UnknownFeatureName {
                name: feature.to_owned(),
            })?;
        Ok(entry
            .support
            .get(browser)
            .is_some_and(|ranges| resolve(ranges, version)))
    }

    fn feature_names(&self) -> FeatureSet {
        self.features.keys().cloned().collect()
    }

    fn feature_title(&self, feature: &str) -> Option<&str> {
        self.features.get(feature).map(|entry| entry.title.as_str())
    }

    fn features_of(&self, browser: &str, version: &Version) -> Result<FeatureSet> {
        self.ensure_browser(browser)?;
        Ok(self
            .features
            .iter()
            .filter(|(_, entry)| {
                entry
                    .support
                    .get(browser)
                    .is_some_and(|ranges| resolve(ranges, version))
            })
            .map(|(name, _)| name.clone())
            .collect())
    }
}
