//! Usage-export browser identifiers to capability-database identifiers.
//!
//! Translation order for one `(name, version)` pair:
//! 1. Map the display name through the [`NormalizationTable`]. Unmapped
//!    names are reported, never guessed.
//! 2. Reject ids the capability database does not know.
//! 3. If the browser has an engine-build table and some engine build is at
//!    or below the observed version, take that build's release as the
//!    observed version.
//! 4. Round down to the greatest release the capability database knows
//!    that does not exceed the observed version.

use std::collections::BTreeMap;

use reachframe_error::{ReachError, Result};
use reachframe_types::{BrowserRecord, Version};
use tracing::debug;

use crate::capability::CapabilityDatabase;
use crate::tables::NormalizationTable;

/// Translates export-side browser names and versions.
///
/// Known versions for every id the table can produce are fetched from the
/// database once, at construction.
pub struct BrowserNormalizer<'db> {
    table: NormalizationTable,
    db: &'db dyn CapabilityDatabase,
    known: BTreeMap<String, Vec<Version>>,
}

impl<'db> BrowserNormalizer<'db> {
    pub fn new(table: NormalizationTable, db: &'db dyn CapabilityDatabase) -> Self {
        let known = table
            .browser_ids()
            .filter_map(|id| match db.known_versions(id) {
                Ok(versions) => Some((id.to_owned(), versions)),
                Err(error) => {
                    debug!(browser = id, %error, "normalization target missing from capability data");
                    None
                }
            })
            .collect();
        Self { table, db, known }
    }

    /// The capability database this normalizer resolves against.
    pub fn database(&self) -> &'db dyn CapabilityDatabase {
        self.db
    }

    /// Translate an export `(name, version)` pair to `(browser id, version)`.
    ///
    /// # Errors
    ///
    /// [`ReachError::InvalidVersion`] for unparseable version text;
    /// [`ReachError::UnresolvableBrowser`] when no mapping or candidate exists.
    pub fn translate(&self, name: &str, version: &str) -> Result<(String, Version)> {
        let browser = self
            .table
            .browser_id(name)
            .ok_or_else(|| ReachError::unresolvable(name, version, "unmapped browser name"))?;
        let observed = Version::parse(version)?;

        let known = self.known.get(browser).ok_or_else(|| {
            ReachError::unresolvable(
                name,
                version,
                format!("capability data has no browser '{browser}'"),
            )
        })?;

        if let Some(release) = self
            .table
            .engine_builds(browser)
            .and_then(|builds| builds.release_for(&observed))
        {
            // Engine tables name point releases the database may not list.
            let resolved = round_down(known, release).ok_or_else(|| {
                ReachError::unresolvable(name, version, "no known release at or below engine build")
            })?;
            debug!(name, version, browser, release = %release, resolved = %resolved, "engine build translated");
            return Ok((browser.to_owned(), resolved.clone()));
        }

        let resolved = round_down(known, &observed)
            .ok_or_else(|| ReachError::unresolvable(name, version, "no known release at or below"))?;
        debug!(name, version, browser, resolved = %resolved, "version rounded down");
        Ok((browser.to_owned(), resolved.clone()))
    }

    /// Translate and attach a user count plus the original identifiers.
    ///
    /// # Errors
    ///
    /// Same as [`BrowserNormalizer::translate`].
    pub fn normalize(&self, name: &str, version: &str, users: u64) -> Result<BrowserRecord> {
        let (browser, resolved) = self.translate(name, version)?;
        Ok(BrowserRecord::new(browser, resolved, users).with_original(name, version))
    }

    /// Whether `(name, version)` would translate.
    pub fn is_known(&self, name: &str, version: &str) -> bool {
        self.translate(name, version).is_ok()
    }
}

/// Greatest known release whose numeric core does not exceed `observed`.
/// Prerelease and build metadata of `observed` do not push it below an
/// equal release.
fn round_down<'a>(known: &'a [Version], observed: &Version) -> Option<&'a Version> {
    let ceiling = observed.release();
    known.iter().filter(|candidate| **candidate <= ceiling).max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::StaticCapabilityDb;
    use crate::tables::EngineBuildTable;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn db() -> StaticCapabilityDb {
        StaticCapabilityDb::from_json_str(
            r#"{
                "agents": {
                    "safari": {"versions": ["9.1", "10", "10.1", "11", "15.2-15.3", "15.4", "16.0", "TP"]},
                    "chrome": {"versions": [null, "4", "118", "119", "120"]}
                },
                "features": {}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn maps_display_names() {
        let db = db();
        let normalizer = BrowserNormalizer::new(NormalizationTable::default(), &db);
        let (browser, version) = normalizer.translate("Android Webview", "119.0.6045.163").unwrap();
        assert_eq!(browser, "chrome");
        assert_eq!(version, v("119"));
    }

    #[test]
    fn unmapped_names_are_unresolvable() {
        let db = db();
        let normalizer = BrowserNormalizer::new(NormalizationTable::default(), &db);
        let err = normalizer.translate("Netscape", "4.7").unwrap_err();
        assert!(matches!(err, ReachError::UnresolvableBrowser { .. }));
        assert!(!normalizer.is_known("Netscape", "4.7"));
    }

    #[test]
    fn invalid_versions_propagate() {
        let db = db();
        let normalizer = BrowserNormalizer::new(NormalizationTable::default(), &db);
        let err = normalizer.translate("Chrome", "(not set)").unwrap_err();
        assert!(matches!(err, ReachError::InvalidVersion { .. }));
    }

    #[test]
    fn rounds_down_to_known_release() {
        let db = db();
        let normalizer = BrowserNormalizer::new(NormalizationTable::default(), &db);
        assert_eq!(normalizer.translate("Chrome", "120.0.6099.71").unwrap().1, v("120"));
        assert_eq!(normalizer.translate("Chrome", "121").unwrap().1, v("120"));
        assert_eq!(normalizer.translate("Safari", "15.3.1").unwrap().1, v("15.2"));
        assert_eq!(normalizer.translate("Safari", "16.0-beta").unwrap().1, v("16.0"));
    }

    #[test]
    fn below_every_release_is_unresolvable() {
        let db = db();
        let normalizer = BrowserNormalizer::new(NormalizationTable::default(), &db);
        let err = normalizer.translate("Chrome", "3.9").unwrap_err();
        assert!(matches!(err, ReachError::UnresolvableBrowser { .. }));
    }

    #[test]
    fn webkit_builds_use_engine_table() {
        let db = db();
        let normalizer = BrowserNormalizer::new(NormalizationTable::default(), &db);
        // 604.1.38 is WebKit for Safari 10.1.2, which the database lists as 10.1.
        assert_eq!(normalizer.translate("Safari", "604.1.38").unwrap().1, v("10.1"));
        // 614.3.7.1.5 is Safari 16.2; the database stops at 16.0.
        assert_eq!(normalizer.translate("Safari", "614.3.7.1.5").unwrap().1, v("16.0"));
        assert_eq!(normalizer.translate("Safari", "613.1.17").unwrap().1, v("15.4"));
        // Product versions fall through to the generic algorithm.
        assert_eq!(normalizer.translate("Safari", "10.1").unwrap().1, v("10.1"));
    }

    #[test]
    fn engine_release_below_every_known_release_is_unresolvable() {
        let db = db();
        let table = NormalizationTable::default().with_engine_builds(
            "chrome",
            EngineBuildTable::from_pairs(&[("537.36", "3")]).unwrap(),
        );
        let normalizer = BrowserNormalizer::new(table, &db);
        let err = normalizer.translate("Chrome", "537.36").unwrap_err();
        assert!(matches!(err, ReachError::UnresolvableBrowser { .. }));
    }

    #[test]
    fn engine_translated_versions_are_known_to_the_database() {
        let db = db();
        let normalizer = BrowserNormalizer::new(NormalizationTable::default(), &db);
        let known = db.known_versions("safari").unwrap();
        for build in ["602.1.50", "603.3.8", "604.1.38", "611.2.7.1.4", "612.3.6", "700"] {
            let (_, version) = normalizer.translate("Safari", build).unwrap();
            assert!(known.contains(&version), "{build} -> {version}");
        }
    }

    #[test]
    fn browser_missing_from_database_is_unresolvable() {
        let db = db();
        let normalizer = BrowserNormalizer::new(NormalizationTable::default(), &db);
        let err = normalizer.translate("Firefox", "120").unwrap_err();
        assert!(matches!(err, ReachError::UnresolvableBrowser { .. }));
    }

    #[test]
    fn normalize_keeps_original_identifiers() {
        let db = db();
        let table = NormalizationTable::default().with_engine_builds(
            "chrome",
            EngineBuildTable::from_pairs(&[("537.36", "118")]).unwrap(),
        );
        let normalizer = BrowserNormalizer::new(table, &db);
        let record = normalizer.normalize("Chrome", "537.36", 42).unwrap();
        assert_eq!(record.browser, "chrome");
        assert_eq!(record.version, v("118"));
        assert_eq!(record.users, 42);
        let original = record.original.unwrap();
        assert_eq!(original.name, "Chrome");
        assert_eq!(original.version, "537.36");
    }
}
