//! Static normalization tables: usage-export browser names to capability
//! database identifiers, and historical engine builds to product releases.

use std::collections::BTreeMap;

use reachframe_error::Result;
use reachframe_types::{MissingSegments, Segment, Version, VersionBound};

/// Export display name -> capability-database browser id.
const BROWSER_NAMES: &[(&str, &str)] = &[
    ("Chrome", "chrome"),
    ("Safari", "safari"),
    ("Edge", "edge"),
    ("Firefox", "firefox"),
    ("Samsung Internet", "samsung"),
    ("Android Webview", "chrome"),
    ("Safari (in-app)", "ios_saf"),
    ("Opera", "opera"),
    ("Android Browser", "android"),
    ("UC Browser", "and_uc"),
    ("Internet Explorer", "ie"),
];

/// WebKit build segments -> Safari release, for exports that report the
/// engine build.
const WEBKIT_TO_SAFARI: &[(&[u64], [u64; 3])] = &[
    (&[602, 1, 50], [10, 0, 0]),
    (&[602, 2, 14], [10, 0, 1]),
    (&[602, 3, 12], [10, 0, 2]),
    (&[602, 4, 8], [10, 0, 3]),
    (&[603, 1, 30], [10, 1, 0]),
    (&[603, 2, 4], [10, 1, 1]),
    (&[603, 3, 8], [10, 1, 2]),
    (&[604, 2, 4], [11, 0, 0]),
    (&[605, 1, 33], [11, 1, 0]),
    (&[606, 1, 36], [12, 0, 0]),
    (&[607, 1, 40], [12, 1, 0]),
    (&[608, 2, 11], [13, 0, 0]),
    (&[610, 2, 11], [14, 0, 0]),
    (&[610, 3, 7, 1, 9], [14, 0, 2]),
    (&[610, 4, 3, 1, 4], [14, 0, 3]),
    (&[611, 1, 21, 161, 7], [14, 1, 0]),
    (&[611, 2, 7, 1, 4], [14, 1, 1]),
    (&[611, 3, 10, 1, 5], [14, 1, 2]),
    (&[612, 1, 29], [15, 0, 0]),
    (&[612, 2, 9], [15, 1, 0]),
    (&[612, 3, 6], [15, 2, 0]),
    (&[613, 1, 17], [15, 4, 0]),
    (&[613, 2, 7], [15, 5, 0]),
    (&[614, 3, 7, 1, 5], [16, 2, 0]),
];

/// Engine build -> release version for one browser family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineBuildTable {
    /// Sorted ascending by engine build.
    entries: Vec<(VersionBound, Version)>,
}

impl EngineBuildTable {
    /// Build a table from `(engine build, release)` text pairs.
    ///
    /// # Errors
    ///
    /// [`reachframe_error::ReachError::InvalidVersion`] for malformed entries.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Result<Self> {
        let entries = pairs
            .iter()
            .map(|(build, release)| {
                Ok((
                    VersionBound::parse(build, MissingSegments::Zero)?,
                    Version::parse(release)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::sorted(entries))
    }

    /// Build a table from numeric `(engine build segments, major.minor.patch)`
    /// pairs. Every segment is exact; absent ones are zero.
    pub fn from_segments(pairs: &[(&[u64], [u64; 3])]) -> Self {
        let entries = pairs
            .iter()
            .map(|(build, [major, minor, patch])| {
                (exact_bound(build), Version::new(*major, *minor, *patch))
            })
            .collect();
        Self::sorted(entries)
    }

    fn sorted(mut entries: Vec<(VersionBound, Version)>) -> Self {
        entries.sort_by_cached_key(|(build, _)| build.floor());
        Self { entries }
    }

    /// Release for the highest engine build at or below `observed`.
    /// Prerelease and build metadata of `observed` are ignored.
    pub fn release_for(&self, observed: &Version) -> Option<&Version> {
        self.entries
            .iter()
            .rev()
            .find(|(build, _)| build.compare_to(observed).is_le())
            .map(|(_, release)| release)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything the normalizer needs besides the capability database.
///
/// Built once at start-up and injected; never global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationTable {
    names: BTreeMap<String, String>,
    engine_builds: BTreeMap<String, EngineBuildTable>,
}

impl NormalizationTable {
    /// A table with no mappings.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            names: BTreeMap::new(),
            engine_builds: BTreeMap::new(),
        }
    }

    /// Map an export-side display name to a database browser id.
    #[must_use]
    pub fn with_name(mut self, display: impl Into<String>, browser_id: impl Into<String>) -> Self {
        self.names.insert(display.into(), browser_id.into());
        self
    }

    /// Attach an engine-build table to a database browser id.
    #[must_use]
    pub fn with_engine_builds(mut self, browser_id: impl Into<String>, table: EngineBuildTable) -> Self {
        self.engine_builds.insert(browser_id.into(), table);
        self
    }

    /// Database id for an export-side display name.
    pub fn browser_id(&self, display: &str) -> Option<&str> {
        self.names.get(display).map(String::as_str)
    }

    /// Engine-build table for a database browser id, if it has one.
    pub fn engine_builds(&self, browser_id: &str) -> Option<&EngineBuildTable> {
        self.engine_builds.get(browser_id)
    }

    /// Distinct database ids this table can produce.
    pub fn browser_ids(&self) -> impl Iterator<Item = &str> {
        let mut ids: Vec<&str> = self.names.values().map(String::as_str).collect();
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter()
    }
}

fn exact_bound(segments: &[u64]) -> VersionBound {
    let at = |index: usize| segments.get(index).copied().unwrap_or(0);
    VersionBound {
        major: at(0),
        minor: Segment::Exact(at(1)),
        patch: Segment::Exact(at(2)),
        build: Segment::Exact(segments.get(3..).unwrap_or_default().to_vec()),
    }
}

impl Default for NormalizationTable {
    /// Export names from common web-analytics tools and the WebKit build
    /// history of Safari 10 through 16.
    fn default() -> Self {
        let names = BROWSER_NAMES
            .iter()
            .map(|(display, id)| ((*display).to_owned(), (*id).to_owned()))
            .collect();
        let mut engine_builds = BTreeMap::new();
        engine_builds.insert(
            "safari".to_owned(),
            EngineBuildTable::from_segments(WEBKIT_TO_SAFARI),
        );
        Self {
            names,
            engine_builds,
        }
    }
}
