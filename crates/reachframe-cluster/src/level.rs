use std::fmt;
use std::str::FromStr;

use reachframe_error::{ReachError, Result};
use reachframe_types::Version;
use serde::{Deserialize, Serialize};

/// Granularity versions are truncated to before version clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterLevel {
    Major,
    Minor,
    #[default]
    Full,
}

impl ClusterLevel {
    /// Parse a CLI/env string like `major|minor|full`.
    ///
    /// # Errors
    ///
    /// [`ReachError::InvalidConfig`] for any other value.
    pub fn parse(s: &str) -> Result<Self> {
        let v = s.trim().to_ascii_lowercase();
        match v.as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "full" => Ok(Self::Full),
            _ => Err(ReachError::config(format!(
                "invalid cluster level `{s}` (expected major|minor|full)"
            ))),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Full => "full",
        }
    }

    /// Truncate `version` to this level.
    #[must_use]
    pub fn apply(self, version: &Version) -> Version {
        match self {
            Self::Major => version.to_major(),
            Self::Minor => version.to_minor(),
            Self::Full => version.clone(),
        }
    }
}

impl fmt::Display for ClusterLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClusterLevel {
    type Err = ReachError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(ClusterLevel::parse(" Major ").unwrap(), ClusterLevel::Major);
        assert_eq!("minor".parse::<ClusterLevel>().unwrap(), ClusterLevel::Minor);
        assert_eq!(ClusterLevel::parse("FULL").unwrap(), ClusterLevel::Full);
        assert!(ClusterLevel::parse("patch").is_err());
    }

    #[test]
    fn apply_truncates() {
        let version = Version::parse("15.4.1-beta.2").unwrap();
        assert_eq!(ClusterLevel::Major.apply(&version), Version::new(15, 0, 0));
        assert_eq!(ClusterLevel::Minor.apply(&version), Version::new(15, 4, 0));
        assert_eq!(ClusterLevel::Full.apply(&version), version);
    }

    #[test]
    fn serde_lowercase() {
        let json = serde_json::to_string(&ClusterLevel::Minor).unwrap();
        assert_eq!(json, "\"minor\"");
        let level: ClusterLevel = serde_json::from_str("\"major\"").unwrap();
        assert_eq!(level, ClusterLevel::Major);
        assert_eq!(ClusterLevel::default(), ClusterLevel::Full);
    }
}
