//! The end-to-end pipeline: normalize, cluster by version, cluster by
//! feature set, cut frames, tally the watch-list.
//!
//! A run is a pure function of its input, its configuration and the
//! read-only capability database. All accumulators are local to
//! [`Engine::run`], so one `Engine` can serve concurrent runs.

use std::collections::BTreeMap;
use std::path::Path;

use reachframe_browser::{BrowserNormalizer, CapabilityDatabase, NormalizationTable};
use reachframe_cluster::{FeatureClusterer, VersionClusterer};
use reachframe_error::{ReachError, Result};
use reachframe_types::BrowserRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::frames::FrameBuilder;
use crate::report::{FeatureUsage, Report, Stats};

/// One row of a decoded usage export, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Export-side display name, e.g. `Safari (in-app)`.
    pub browser: String,
    /// Export-side version text.
    pub version: String,
    pub users: u64,
}

impl UsageRecord {
    pub fn new(browser: impl Into<String>, version: impl Into<String>, users: u64) -> Self {
        Self {
            browser: browser.into(),
            version: version.into(),
            users,
        }
    }

    /// Key under which an unrecognized record is reported.
    pub fn unknown_key(&self) -> String {
        format!("{} {}", self.browser, self.version)
    }
}

/// A decoded usage export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageInput {
    /// Grand total reported by the export; the sum of `records` otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_users: Option<u64>,
    pub records: Vec<UsageRecord>,
}

impl UsageInput {
    pub fn new(records: Vec<UsageRecord>) -> Self {
        Self {
            total_users: None,
            records,
        }
    }

    /// # Errors
    ///
    /// [`ReachError::Decode`] if the JSON does not decode.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ReachError::decode(e.to_string()))
    }

    /// # Errors
    ///
    /// I/O errors or [`ReachError::Decode`].
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn total_users(&self) -> u64 {
        self.total_users.unwrap_or_else(|| {
            self.records
                .iter()
                .fold(0_u64, |acc, record| acc.saturating_add(record.users))
        })
    }
}

/// Configured pipeline bound to one capability database.
pub struct Engine<'db> {
    normalizer: BrowserNormalizer<'db>,
    config: EngineConfig,
    frames: FrameBuilder,
}

impl<'db> Engine<'db> {
    /// # Errors
    ///
    /// [`ReachError::InvalidConfig`] if `config` does not validate.
    pub fn new(
        db: &'db dyn CapabilityDatabase,
        table: NormalizationTable,
        config: EngineConfig,
    ) -> Result<Self> {
        let frames = FrameBuilder::new(config.thresholds.clone())?;
        Ok(Self {
            normalizer: BrowserNormalizer::new(table, db),
            config,
            frames,
        })
    }

    /// Engine with the built-in normalization table and default config.
    ///
    /// # Errors
    ///
    /// Never in practice; the defaults validate.
    pub fn with_defaults(db: &'db dyn CapabilityDatabase) -> Result<Self> {
        Self::new(db, NormalizationTable::default(), EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &BrowserNormalizer<'db> {
        &self.normalizer
    }

    /// Run the whole pipeline over one usage export.
    ///
    /// Records that fail to normalize are excluded and counted as unknown.
    /// Watch-list names the database lacks are reported in
    /// `stats.unknown_features` and skipped.
    ///
    /// # Errors
    ///
    /// Only non-recoverable errors, e.g. capability data that contradicts
    /// itself during feature resolution.
    pub fn run(&self, input: &UsageInput) -> Result<Report> {
        let db = self.normalizer.database();
        let mut stats = Stats {
            total_users: input.total_users(),
            ..Stats::default()
        };

        let mut records: Vec<BrowserRecord> = Vec::with_capacity(input.records.len());
        for usage in &input.records {
            match self.normalizer.normalize(&usage.browser, &usage.version, usage.users) {
                Ok(record) => {
                    stats.known_browsers += 1;
                    records.push(record);
                }
                Err(error) if error.is_record_recoverable() => {
                    if matches!(error, ReachError::InvalidVersion { .. }) {
                        warn!(browser = %usage.browser, version = %usage.version, %error, "unparseable version counted as unknown");
                    } else {
                        debug!(browser = %usage.browser, version = %usage.version, %error, "browser counted as unknown");
                    }
                    stats.unknown_users = stats.unknown_users.saturating_add(usage.users);
                    let slot = stats.unknown_browsers.entry(usage.unknown_key()).or_insert(0);
                    *slot = slot.saturating_add(usage.users);
                }
                Err(error) => return Err(error),
            }
        }
        stats.adjusted_total_users = stats.total_users.saturating_sub(stats.unknown_users);
        info!(
            known = stats.known_browsers,
            unknown = stats.unknown_browsers.len(),
            unknown_users = stats.unknown_users,
            adjusted_total = stats.adjusted_total_users,
            "usage normalized"
        );

        let clusterer = VersionClusterer::new(self.config.cluster_level);
        let versions = clusterer.cluster(records);
        stats.unique_version_clusters = versions.len();
        let clusters = FeatureClusterer::new(db).cluster(versions)?;
        stats.unique_feature_clusters = clusters.len();
        info!(
            level = %clusterer.level(),
            version_clusters = stats.unique_version_clusters,
            feature_clusters = stats.unique_feature_clusters,
            "clustering done"
        );

        let frames = self
            .frames
            .build(&clusters, &db.feature_names(), stats.adjusted_total_users);

        let mut features = BTreeMap::new();
        for name in &self.config.watch_features {
            if !db.has_feature(name) {
                let error = ReachError::UnknownFeatureName { name: name.clone() };
                warn!(%error, "watch-list entry skipped");
                stats.unknown_features.push(name.clone());
                continue;
            }
            features.insert(name.clone(), FeatureUsage::tally(name, &clusters));
        }

        info!(frames = frames.len(), watched = features.len(), "report ready");
        Ok(Report {
            stats,
            frames,
            features,
            feature_titles: db.feature_titles(),
        })
    }
}
