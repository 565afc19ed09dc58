//! Clusters of browser populations sharing one feature set.

use std::collections::BTreeMap;

use reachframe_types::{BrowserRecord, FeatureSet, Version};
use serde::{Deserialize, Serialize};

/// Browser id -> versions, the (browser, version) pairs of a cluster or of a
/// running union of clusters.
///
/// After [`Membership::normalize`] each version list is duplicate-free and
/// sorted descending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Membership(BTreeMap<String, Vec<Version>>);

impl Membership {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, browser: &str, version: Version) {
        self.0.entry(browser.to_owned()).or_default().push(version);
    }

    /// Append every pair of `other`.
    pub fn merge(&mut self, other: &Self) {
        for (browser, versions) in &other.0 {
            self.0
                .entry(browser.clone())
                .or_default()
                .extend(versions.iter().cloned());
        }
    }

    /// Sort each browser's versions descending and drop duplicates.
    pub fn normalize(&mut self) {
        for versions in self.0.values_mut() {
            versions.sort_by(|a, b| b.cmp(a));
            versions.dedup();
        }
    }

    /// Number of (browser, version) pairs.
    pub fn size(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, browser: &str, version: &Version) -> bool {
        self.0
            .get(browser)
            .is_some_and(|versions| versions.contains(version))
    }

    pub fn versions(&self, browser: &str) -> Option<&[Version]> {
        self.0.get(browser).map(Vec::as_slice)
    }

    pub fn browsers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Version])> {
        self.0.iter().map(|(browser, versions)| (browser.as_str(), versions.as_slice()))
    }
}

/// A group of (browser, version) populations with identical feature sets.
///
/// `users` always equals the sum of `records[*].users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Primary browser: the browser of the seed record.
    pub browser: String,
    /// Highest member version of the primary browser once normalized.
    pub version: Version,
    pub users: u64,
    pub features: FeatureSet,
    pub members: Membership,
    /// Per-version attribution, descending by users once normalized.
    pub records: Vec<BrowserRecord>,
}

impl Cluster {
    /// Seed a cluster from one record.
    #[must_use]
    pub fn from_record(record: BrowserRecord, features: FeatureSet) -> Self {
        let mut members = Membership::new();
        members.add(&record.browser, record.version.clone());
        Self {
            browser: record.browser.clone(),
            version: record.version.clone(),
            users: record.users,
            features,
            members,
            records: vec![record],
        }
    }

    /// Add one record's population.
    pub fn add_record(&mut self, record: BrowserRecord) {
        self.members.add(&record.browser, record.version.clone());
        self.users = self.users.saturating_add(record.users);
        self.records.push(record);
    }

    /// Freeze the cluster before it is exposed downstream.
    pub fn normalize(&mut self) {
        self.members.normalize();
        self.records.sort_by(|a, b| b.users.cmp(&a.users));
        if let Some(highest) = self
            .members
            .versions(&self.browser)
            .and_then(|versions| versions.first())
        {
            self.version = highest.clone();
        }
    }

    /// Number of (browser, version) pairs.
    pub fn size(&self) -> usize {
        self.members.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn features(items: &[&str]) -> FeatureSet {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn from_record_seeds_membership() {
        let cluster = Cluster::from_record(
            BrowserRecord::new("chrome", v("120"), 10),
            features(&["a"]),
        );
        assert_eq!(cluster.users, 10);
        assert_eq!(cluster.size(), 1);
        assert!(cluster.members.contains("chrome", &v("120")));
    }

    #[test]
    fn normalize_sorts_and_picks_highest_primary_version() {
        let mut cluster = Cluster::from_record(
            BrowserRecord::new("chrome", v("118"), 5),
            features(&["a"]),
        );
        cluster.add_record(BrowserRecord::new("chrome", v("120"), 7));
        cluster.add_record(BrowserRecord::new("edge", v("120"), 9));
        cluster.add_record(BrowserRecord::new("chrome", v("119"), 1));
        cluster.normalize();

        assert_eq!(cluster.users, 22);
        assert_eq!(cluster.version, v("120"));
        assert_eq!(
            cluster.members.versions("chrome").unwrap(),
            &[v("120"), v("119"), v("118")]
        );
        assert_eq!(cluster.records[0].browser, "edge");
        assert_eq!(cluster.size(), 4);
    }

    #[test]
    fn membership_dedups_after_merge() {
        let mut a = Membership::new();
        a.add("firefox", v("115"));
        let mut b = Membership::new();
        b.add("firefox", v("115"));
        b.add("firefox", v("121"));
        a.merge(&b);
        assert_eq!(a.size(), 3);
        a.normalize();
        assert_eq!(a.versions("firefox").unwrap(), &[v("121"), v("115")]);
        assert_eq!(a.browsers().collect::<Vec<_>>(), vec!["firefox"]);
    }

    #[test]
    fn membership_serializes_as_map() {
        let mut m = Membership::new();
        m.add("safari", v("16.2"));
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json, serde_json::json!({"safari": ["16.2.0"]}));
    }
}
