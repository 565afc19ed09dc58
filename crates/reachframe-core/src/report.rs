//! Engine output.

use std::collections::BTreeMap;

use reachframe_cluster::{Cluster, Membership};
use reachframe_error::{ReachError, Result};
use reachframe_types::{FeatureSet, Version};
use serde::{Deserialize, Serialize};

use crate::frames::Frame;

/// Counters describing one run's input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Input records that normalized.
    pub known_browsers: u64,
    /// `"name version"` -> users, for records that did not normalize.
    pub unknown_browsers: BTreeMap<String, u64>,
    pub unknown_users: u64,
    pub total_users: u64,
    /// `total_users - unknown_users`; the denominator of every threshold.
    pub adjusted_total_users: u64,
    pub unique_version_clusters: usize,
    pub unique_feature_clusters: usize,
    /// Watch-list names the capability database does not know.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_features: Vec<String>,
}

impl Stats {
    /// Share of total users that could not be attributed, in `[0, 1]`.
    #[allow(clippy::cast_precision_loss)]
    pub fn unknown_share(&self) -> f64 {
        if self.total_users == 0 {
            0.0
        } else {
            self.unknown_users as f64 / self.total_users as f64
        }
    }
}

/// A cluster lacking a watched feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsupportedCluster {
    pub browser: String,
    pub version: Version,
    pub users: u64,
    pub cluster: Membership,
}

impl From<&Cluster> for UnsupportedCluster {
    fn from(cluster: &Cluster) -> Self {
        Self {
            browser: cluster.browser.clone(),
            version: cluster.version.clone(),
            users: cluster.users,
            cluster: cluster.members.clone(),
        }
    }
}

/// Reach of one watched feature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureUsage {
    /// Users whose cluster supports the feature.
    pub users: u64,
    /// Clusters without it, descending by users.
    pub unsupported: Vec<UnsupportedCluster>,
}

impl FeatureUsage {
    /// Tally `feature` over clusters sorted descending by users.
    pub fn tally(feature: &str, clusters: &[Cluster]) -> Self {
        let mut usage = Self::default();
        for cluster in clusters {
            if cluster.features.contains(feature) {
                usage.users = usage.users.saturating_add(cluster.users);
            } else {
                usage.unsupported.push(UnsupportedCluster::from(cluster));
            }
        }
        usage
    }
}

/// Everything one run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub stats: Stats,
    pub frames: Vec<Frame>,
    /// Watched feature name -> reach.
    pub features: BTreeMap<String, FeatureUsage>,
    /// Feature name -> title, straight from the capability database.
    pub feature_titles: BTreeMap<String, String>,
}

impl Report {
    /// The full feature set of every frame, replayed from the deltas.
    pub fn feature_sets(&self) -> Vec<FeatureSet> {
        let mut current = FeatureSet::new();
        self.frames
            .iter()
            .map(|frame| {
                if let Some(available) = &frame.available {
                    current.clone_from(available);
                }
                if let Some(removed) = &frame.removed {
                    current.retain(|name| !removed.contains(name));
                }
                if let Some(added) = &frame.added {
                    current.extend(added.iter().cloned());
                }
                current.clone()
            })
            .collect()
    }

    /// Serialize as pretty JSON.
    ///
    /// # Errors
    ///
    /// [`ReachError::Internal`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ReachError::internal(e.to_string()))
    }
}
