//! Feature clustering: group version-clustered records whose resolved
//! feature sets are identical.
//!
//! Entries are sorted ascending by `(|features|, users)` and the largest
//! remaining entry seeds each cluster. Only entries with an equal-size
//! feature set are candidates for a seed, and among those set equality is
//! the same as being a subset. Because the pool stays sorted by size, the
//! candidates are always a contiguous tail of it, so each seed scans one
//! size class instead of the whole pool.

use reachframe_browser::CapabilityDatabase;
use reachframe_error::Result;
use reachframe_types::set_ops::is_subset_of;
use reachframe_types::{BrowserRecord, FeatureSet};
use tracing::debug;

use crate::cluster::Cluster;

/// Resolves each record's feature set and groups equal sets.
pub struct FeatureClusterer<'db> {
    db: &'db dyn CapabilityDatabase,
}

impl<'db> FeatureClusterer<'db> {
    pub fn new(db: &'db dyn CapabilityDatabase) -> Self {
        Self { db }
    }

    /// Resolve and cluster version-clustered records.
    ///
    /// # Errors
    ///
    /// Propagates resolution errors, e.g. a browser id the database does
    /// not know.
    pub fn cluster(&self, records: Vec<BrowserRecord>) -> Result<Vec<Cluster>> {
        let resolved = records
            .into_iter()
            .map(|record| {
                let features = self.db.features_of(&record.browser, &record.version)?;
                Ok((record, features))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(cluster_resolved(resolved))
    }
}

/// Cluster records whose feature sets are already resolved.
///
/// Output clusters have pairwise distinct feature sets, are sorted
/// descending by users and are normalized.
pub fn cluster_resolved(mut pool: Vec<(BrowserRecord, FeatureSet)>) -> Vec<Cluster> {
    pool.sort_by(|(a, a_features), (b, b_features)| {
        a_features
            .len()
            .cmp(&b_features.len())
            .then(a.users.cmp(&b.users))
    });

    let mut clusters = Vec::new();
    while let Some((seed, features)) = pool.pop() {
        let mut cluster = Cluster::from_record(seed, features);
        let size = cluster.features.len();
        let start = pool.partition_point(|(_, candidate)| candidate.len() < size);

        let same_size = pool.split_off(start);
        for (record, candidate) in same_size {
            if is_subset_of(&candidate, &cluster.features) {
                cluster.add_record(record);
            } else {
                pool.push((record, candidate));
            }
        }
        clusters.push(cluster);
    }

    clusters.sort_by(|a, b| b.users.cmp(&a.users));
    for cluster in &mut clusters {
        cluster.normalize();
    }
    debug!(clusters = clusters.len(), "feature clustering done");
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use reachframe_browser::StaticCapabilityDb;
    use reachframe_types::Version;

    fn record(browser: &str, version: &str, users: u64) -> BrowserRecord {
        BrowserRecord::new(browser, Version::parse(version).unwrap(), users)
    }

    fn features(items: &[&str]) -> FeatureSet {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn equal_sets_merge() {
        let clusters = cluster_resolved(vec![
            (record("a", "10.0", 100), features(&["f1", "f2"])),
            (record("a", "10.1", 50), features(&["f1", "f2"])),
            (record("b", "5.0", 50), features(&["f1"])),
        ]);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].users, 150);
        assert_eq!(clusters[0].features, features(&["f1", "f2"]));
        assert_eq!(clusters[0].browser, "a");
        assert_eq!(clusters[0].version, Version::parse("10.1").unwrap());
        assert_eq!(clusters[1].users, 50);
        assert_eq!(clusters[1].size(), 1);
    }

    #[test]
    fn equal_size_different_sets_stay_apart() {
        let clusters = cluster_resolved(vec![
            (record("a", "1", 3), features(&["x", "y"])),
            (record("b", "1", 2), features(&["x", "z"])),
            (record("c", "1", 1), features(&["x", "y"])),
            (record("d", "1", 9), features(&[])),
        ]);
        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[0].users, 9);
        assert_eq!(clusters[1].users, 4);
        assert_eq!(clusters[1].features, features(&["x", "y"]));
        assert_eq!(clusters[2].users, 2);
    }

    #[test]
    fn strict_subsets_do_not_merge() {
        let clusters = cluster_resolved(vec![
            (record("a", "2", 5), features(&["x", "y"])),
            (record("a", "1", 5), features(&["x"])),
        ]);
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn empty_pool() {
        assert!(cluster_resolved(Vec::new()).is_empty());
    }

    #[test]
    fn resolves_through_database() {
        let db = StaticCapabilityDb::from_json_str(
            r#"{
                "agents": {"chrome": {"versions": ["118", "119", "120"]}},
                "features": {
                    "css-has": {"title": "CSS :has()", "stats": {"chrome": {"118": "n", "119-120": "y"}}},
                    "flexbox": {"title": "Flexbox", "stats": {"chrome": {"118-120": "y"}}}
                }
            }"#,
        )
        .unwrap();
        let clusters = FeatureClusterer::new(&db)
            .cluster(vec![
                record("chrome", "118", 10),
                record("chrome", "119", 20),
                record("chrome", "120", 30),
            ])
            .unwrap();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].users, 50);
        assert_eq!(clusters[0].version, Version::new(120, 0, 0));
        assert_eq!(clusters[1].features, features(&["flexbox"]));

        let err = FeatureClusterer::new(&db)
            .cluster(vec![record("opera", "1", 1)])
            .unwrap_err();
        assert!(matches!(err, reachframe_error::ReachError::UnknownBrowserId { .. }));
    }
}
