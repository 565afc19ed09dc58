//! Version clustering: collapse records naming the same (browser, version)
//! into one record whose `users` is the sum of the run.

use reachframe_types::BrowserRecord;
use tracing::debug;

use crate::level::ClusterLevel;

/// Groups normalized records by (browser, version).
///
/// The output does not depend on input order: records are sorted by
/// `(browser, version, original)` before adjacent runs are merged, and the
/// final descending-by-users sort is stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionClusterer {
    level: ClusterLevel,
}

impl VersionClusterer {
    #[must_use]
    pub const fn new(level: ClusterLevel) -> Self {
        Self { level }
    }

    pub const fn level(&self) -> ClusterLevel {
        self.level
    }

    /// Merge records with equal (browser, version) keys.
    ///
    /// Each merged record keeps the original identifiers of the first record
    /// of its run in sorted order.
    pub fn cluster(&self, records: Vec<BrowserRecord>) -> Vec<BrowserRecord> {
        let input = records.len();
        let mut records: Vec<BrowserRecord> = records
            .into_iter()
            .map(|mut record| {
                record.version = self.level.apply(&record.version);
                record
            })
            .collect();
        records.sort_by(|a, b| {
            a.browser
                .cmp(&b.browser)
                .then_with(|| a.version.cmp(&b.version))
                .then_with(|| a.original.cmp(&b.original))
        });

        let mut merged: Vec<BrowserRecord> = Vec::with_capacity(records.len());
        for record in records {
            match merged.last_mut() {
                Some(last) if last.same_population(&record) => last.absorb(&record),
                _ => merged.push(record),
            }
        }
        merged.sort_by(|a, b| b.users.cmp(&a.users));

        debug!(input, clusters = merged.len(), level = %self.level, "version clustering done");
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reachframe_types::Version;

    fn record(browser: &str, version: &str, users: u64) -> BrowserRecord {
        BrowserRecord::new(browser, Version::parse(version).unwrap(), users)
    }

    #[test]
    fn merges_equal_versions() {
        let out = VersionClusterer::default().cluster(vec![
            record("chrome", "120", 10),
            record("firefox", "121", 3),
            record("chrome", "120.0.0", 5),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].browser, "chrome");
        assert_eq!(out[0].users, 15);
        assert_eq!(out[1].users, 3);
    }

    #[test]
    fn input_order_does_not_matter() {
        let records = vec![
            record("chrome", "120", 10).with_original("Chrome", "120.0.1"),
            record("chrome", "120", 4).with_original("Android Webview", "120.0.2"),
            record("edge", "120", 14),
            record("safari", "16.2", 7),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let clusterer = VersionClusterer::default();
        assert_eq!(clusterer.cluster(records), clusterer.cluster(reversed));
    }

    #[test]
    fn level_truncates_before_merging() {
        let records = vec![
            record("safari", "16.1", 1),
            record("safari", "16.2", 2),
            record("safari", "15.6", 4),
        ];
        let minor = VersionClusterer::new(ClusterLevel::Minor).cluster(records.clone());
        assert_eq!(minor.len(), 3);

        let major = VersionClusterer::new(ClusterLevel::Major).cluster(records);
        assert_eq!(major.len(), 2);
        assert_eq!(major[0].version, Version::new(15, 0, 0));
        assert_eq!(major[0].users, 4);
        assert_eq!(major[1].users, 3);
    }

    #[test]
    fn empty_input() {
        assert!(VersionClusterer::default().cluster(Vec::new()).is_empty());
    }
}
