use serde::{Deserialize, Serialize};

use crate::version::Version;

/// The export-side identity a record was normalized from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OriginalBrowser {
    pub name: String,
    pub version: String,
}

/// One normalized (browser, version) population.
///
/// Only `users` changes after creation, and only upward through merges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserRecord {
    /// Capability-database browser identifier.
    pub browser: String,
    pub version: Version,
    pub users: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<OriginalBrowser>,
}

impl BrowserRecord {
    #[must_use]
    pub fn new(browser: impl Into<String>, version: Version, users: u64) -> Self {
        Self {
            browser: browser.into(),
            version,
            users,
            original: None,
        }
    }

    #[must_use]
    pub fn with_original(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.original = Some(OriginalBrowser {
            name: name.into(),
            version: version.into(),
        });
        self
    }

    /// Whether both records name the same (browser, version) population.
    pub fn same_population(&self, other: &Self) -> bool {
        self.browser == other.browser && self.version == other.version
    }

    /// Add another record's users to this one.
    pub fn absorb(&mut self, other: &Self) {
        self.users = self.users.saturating_add(other.users);
    }
}
