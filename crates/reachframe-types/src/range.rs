//! Version range bounds and textual ranges (`"low"` or `"low-high"`).
//!
//! A [`VersionBound`] is the only place a wildcard may appear. Bounds never
//! compare prerelease or build metadata, and a wildcarded numeric segment
//! compares equal to anything. Wildcards cannot leak into stored data:
//! [`VersionBound::floor`] resolves them to zero.
//!
//! Missing numeric segments are filled by the caller's [`MissingSegments`]
//! policy. A single-bound range fills them with zero, so `"10.1"` matches
//! exactly `10.1.0`. A two-bound range leaves them wildcarded, so
//! `"10.1-10.3"` admits `10.3.5`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use reachframe_error::{ReachError, Result};

use crate::version::{ToVersion, Version, VersionParts, cmp_build};

/// A numeric bound segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment<T = u64> {
    /// Must compare by value.
    Exact(T),
    /// Ignored during comparison.
    Any,
}

/// How a bound fills numeric segments absent from its text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingSegments {
    /// Absent segments are exactly zero.
    Zero,
    /// Absent segments are wildcards.
    Wildcard,
}

/// One end of a range. Prerelease and build metadata are always wildcarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionBound {
    pub major: u64,
    pub minor: Segment,
    pub patch: Segment,
    pub build: Segment<Vec<u64>>,
}

impl VersionBound {
    /// Parse one bound.
    ///
    /// # Errors
    ///
    /// Returns [`ReachError::InvalidVersion`] if `text` is not a version.
    pub fn parse(text: &str, missing: MissingSegments) -> Result<Self> {
        let parts = VersionParts::parse(text)?;
        let fill = |value: Option<u64>| match (value, missing) {
            (Some(n), _) => Segment::Exact(n),
            (None, MissingSegments::Zero) => Segment::Exact(0),
            (None, MissingSegments::Wildcard) => Segment::Any,
        };
        let numbers = parts.numbers;
        let build = if numbers.len() > 3 {
            Segment::Exact(numbers[3..].to_vec())
        } else if missing == MissingSegments::Zero {
            Segment::Exact(Vec::new())
        } else {
            Segment::Any
        };
        Ok(Self {
            major: numbers.first().copied().unwrap_or(0),
            minor: fill(numbers.get(1).copied()),
            patch: fill(numbers.get(2).copied()),
            build,
        })
    }

    /// Compare this bound against a stored version, skipping wildcards.
    pub fn compare_to(&self, version: &Version) -> Ordering {
        let segment = |bound: &Segment, value: u64| match bound {
            Segment::Exact(n) => n.cmp(&value),
            Segment::Any => Ordering::Equal,
        };
        self.major
            .cmp(&version.major)
            .then_with(|| segment(&self.minor, version.minor))
            .then_with(|| segment(&self.patch, version.patch))
            .then_with(|| match &self.build {
                Segment::Exact(build) => cmp_build(build, version.build()),
                Segment::Any => Ordering::Equal,
            })
    }

    /// Field-wise equality on every non-wildcarded segment.
    pub fn matches_exactly(&self, version: &Version) -> bool {
        self.compare_to(version).is_eq()
    }

    /// The lowest concrete version this bound admits.
    #[must_use]
    pub fn floor(&self) -> Version {
        let exact = |segment: &Segment| match segment {
            Segment::Exact(n) => *n,
            Segment::Any => 0,
        };
        let version = Version::new(self.major, exact(&self.minor), exact(&self.patch));
        match &self.build {
            Segment::Exact(build) => version.with_build(build.clone()),
            Segment::Any => version,
        }
    }
}

/// A parsed `"low"` or `"low-high"` range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    text: String,
    pub low: VersionBound,
    pub high: Option<VersionBound>,
}

impl VersionRange {
    /// Parse a range.
    ///
    /// # Errors
    ///
    /// Returns [`ReachError::InvalidRange`] for anything but one or two
    /// `-`-separated versions.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |_| ReachError::invalid_range(text);
        let mut pieces = text.split('-');
        let (low, high) = match (pieces.next(), pieces.next(), pieces.next()) {
            (Some(low), None, None) => (
                VersionBound::parse(low, MissingSegments::Zero).map_err(invalid)?,
                None,
            ),
            (Some(low), Some(high), None) => (
                VersionBound::parse(low, MissingSegments::Wildcard).map_err(invalid)?,
                Some(VersionBound::parse(high, MissingSegments::Wildcard).map_err(invalid)?),
            ),
            _ => return Err(ReachError::invalid_range(text)),
        };
        Ok(Self {
            text: text.to_owned(),
            low,
            high,
        })
    }

    /// Whether `version` falls inside the range.
    pub fn contains(&self, version: &Version) -> bool {
        match &self.high {
            None => self.low.matches_exactly(version),
            Some(high) => self.low.compare_to(version).is_le() && high.compare_to(version).is_ge(),
        }
    }

    /// Whether `version` lies strictly above the range's upper end.
    pub fn is_below(&self, version: &Version) -> bool {
        self.upper().compare_to(version).is_lt()
    }

    /// The bound that closes the range from above.
    pub fn upper(&self) -> &VersionBound {
        self.high.as_ref().unwrap_or(&self.low)
    }

    /// Lowest concrete version in the range.
    #[must_use]
    pub fn floor(&self) -> Version {
        self.low.floor()
    }

    /// The upper bound with wildcards resolved to zero, for ordering ranges.
    #[must_use]
    pub fn ceiling(&self) -> Version {
        self.upper().floor()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for VersionRange {
    type Err = ReachError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Whether `version` falls inside the textual `range`.
///
/// # Errors
///
/// Returns [`ReachError::InvalidVersion`] or [`ReachError::InvalidRange`].
pub fn matches_range<V: ToVersion + ?Sized>(version: &V, range: &str) -> Result<bool> {
    let version = version.to_version()?;
    Ok(VersionRange::parse(range)?.contains(&version))
}
