//! Extended semantic versions.
//!
//! Grammar: `MAJOR[.MINOR[.PATCH[.BUILD...]]][-PRERELEASE][+META]`.
//!
//! - `MAJOR`, `MINOR` and `PATCH` are `0|[1-9][0-9]*`.
//! - `BUILD` is one or more further dot-separated digit runs. Engine build
//!   strings such as `611.1.21.161.7` carry more than one of them.
//! - `PRERELEASE` and `META` are dot-separated identifiers over
//!   `[A-Za-z0-9_-]`. Identifiers that look like canonical integers compare
//!   numerically, the rest compare as text.
//!
//! Missing numeric segments of a stored [`Version`] are zero. Range bounds
//! keep wildcards instead; see [`crate::range`].
//!
//! # Ordering
//!
//! `Version` implements a total order:
//! 1. `major`, `minor`, `patch`, then build segments (missing segments are 0).
//! 2. Prerelease: a version without one sorts **after** any prerelease of the
//!    same core. Identifiers compare pairwise (numeric < text), then the
//!    shorter list sorts first.
//! 3. Build metadata, by the same rule as prerelease.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use reachframe_error::{ReachError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::limits::{MAX_NUMERIC_SEGMENTS, MAX_VERSION_TEXT_LEN};

/// One prerelease or build-metadata identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    /// A canonical non-negative integer (`0` or no leading zero).
    Numeric(u64),
    /// Anything else.
    Text(String),
}

impl Identifier {
    fn parse(s: &str) -> Option<Self> {
        if s.is_empty()
            || !s
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return None;
        }
        if is_canonical_number(s) {
            if let Ok(n) = s.parse::<u64>() {
                return Some(Self::Numeric(n));
            }
        }
        Some(Self::Text(s.to_owned()))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Numeric(a), Self::Numeric(b)) => a.cmp(b),
            (Self::Numeric(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Numeric(_)) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A concrete, stored version value. Never carries wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Build segments after `patch`, trailing zeros trimmed.
    build: Vec<u64>,
    /// Empty means "no prerelease".
    pub prerelease: Vec<Identifier>,
    /// Empty means "no build metadata".
    pub build_meta: Vec<Identifier>,
}

impl Version {
    /// Create a release version `major.minor.patch`.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            build: Vec::new(),
            prerelease: Vec::new(),
            build_meta: Vec::new(),
        }
    }

    /// Parse text under the extended grammar. Missing numeric segments are 0.
    ///
    /// # Errors
    ///
    /// Returns [`ReachError::InvalidVersion`] if `text` does not match.
    pub fn parse(text: &str) -> Result<Self> {
        let parts = VersionParts::parse(text)?;
        let mut numbers = parts.numbers.into_iter();
        let major = numbers.next().unwrap_or(0);
        let minor = numbers.next().unwrap_or(0);
        let patch = numbers.next().unwrap_or(0);
        Ok(Self {
            major,
            minor,
            patch,
            build: trim_zeros(numbers.collect()),
            prerelease: parts.prerelease,
            build_meta: parts.build_meta,
        })
    }

    /// Replace the build segments.
    #[must_use]
    pub fn with_build(mut self, build: Vec<u64>) -> Self {
        self.build = trim_zeros(build);
        self
    }

    /// Build segments after `patch` (empty when the build is 0).
    pub fn build(&self) -> &[u64] {
        &self.build
    }

    pub fn is_prerelease(&self) -> bool {
        !self.prerelease.is_empty()
    }

    /// The same numeric core without prerelease or build metadata.
    #[must_use]
    pub fn release(&self) -> Self {
        Self::new(self.major, self.minor, self.patch).with_build(self.build.clone())
    }

    /// Keep only `major`; everything else is zeroed or dropped.
    #[must_use]
    pub const fn to_major(&self) -> Self {
        Self::new(self.major, 0, 0)
    }

    /// Keep `major.minor`; everything else is zeroed or dropped.
    #[must_use]
    pub const fn to_minor(&self) -> Self {
        Self::new(self.major, self.minor, 0)
    }

    fn cmp_core(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| cmp_build(&self.build, &other.build))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_core(other)
            .then_with(|| cmp_identifiers(&self.prerelease, &other.prerelease))
            .then_with(|| cmp_identifiers(&self.build_meta, &other.build_meta))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Three-way comparison of two stored versions.
pub fn compare(a: &Version, b: &Version) -> Ordering {
    a.cmp(b)
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        for segment in &self.build {
            write!(f, ".{segment}")?;
        }
        write_identifiers(f, '-', &self.prerelease)?;
        write_identifiers(f, '+', &self.build_meta)
    }
}

impl FromStr for Version {
    type Err = ReachError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// Explicit parse step for public entry points that accept either a parsed
/// [`Version`] or version text.
pub trait ToVersion {
    /// Borrow `self` if it is already a `Version`, parse it otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ReachError::InvalidVersion`] for unparseable text.
    fn to_version(&self) -> Result<Cow<'_, Version>>;
}

impl ToVersion for Version {
    fn to_version(&self) -> Result<Cow<'_, Version>> {
        Ok(Cow::Borrowed(self))
    }
}

impl ToVersion for str {
    fn to_version(&self) -> Result<Cow<'_, Version>> {
        Version::parse(self).map(Cow::Owned)
    }
}

impl ToVersion for String {
    fn to_version(&self) -> Result<Cow<'_, Version>> {
        self.as_str().to_version()
    }
}

impl<T: ToVersion + ?Sized> ToVersion for &T {
    fn to_version(&self) -> Result<Cow<'_, Version>> {
        (**self).to_version()
    }
}

/// Normalize a version argument at a public boundary.
///
/// # Errors
///
/// Returns [`ReachError::InvalidVersion`] for unparseable text.
pub fn parse_if_needed<V: ToVersion + ?Sized>(value: &V) -> Result<Cow<'_, Version>> {
    value.to_version()
}

// ── Grammar ─────────────────────────────────────────────────────────────

/// Raw pieces of a version string, before defaults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VersionParts {
    /// 1..=`MAX_NUMERIC_SEGMENTS` numeric segments, as written.
    pub numbers: Vec<u64>,
    pub prerelease: Vec<Identifier>,
    pub build_meta: Vec<Identifier>,
}

impl VersionParts {
    pub(crate) fn parse(text: &str) -> Result<Self> {
        let invalid = || ReachError::invalid_version(text);
        if text.is_empty() || text.len() > MAX_VERSION_TEXT_LEN {
            return Err(invalid());
        }

        let (rest, build_meta) = match text.split_once('+') {
            Some((rest, meta)) => (rest, parse_identifiers(meta).ok_or_else(invalid)?),
            None => (text, Vec::new()),
        };
        let (core, prerelease) = match rest.split_once('-') {
            Some((core, pre)) => (core, parse_identifiers(pre).ok_or_else(invalid)?),
            None => (rest, Vec::new()),
        };

        let mut numbers = Vec::with_capacity(4);
        for (index, segment) in core.split('.').enumerate() {
            if index >= MAX_NUMERIC_SEGMENTS {
                return Err(invalid());
            }
            let well_formed = if index < 3 {
                is_canonical_number(segment)
            } else {
                !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
            };
            if !well_formed {
                return Err(invalid());
            }
            numbers.push(segment.parse::<u64>().map_err(|_| invalid())?);
        }

        Ok(Self {
            numbers,
            prerelease,
            build_meta,
        })
    }
}

fn parse_identifiers(text: &str) -> Option<Vec<Identifier>> {
    text.split('.').map(Identifier::parse).collect()
}

fn is_canonical_number(s: &str) -> bool {
    match s.as_bytes() {
        [] => false,
        [b'0'] => true,
        [first, rest @ ..] => (b'1'..=b'9').contains(first) && rest.iter().all(u8::is_ascii_digit),
    }
}

fn trim_zeros(mut build: Vec<u64>) -> Vec<u64> {
    while build.last() == Some(&0) {
        build.pop();
    }
    build
}

pub(crate) fn cmp_build(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Absent (empty) sorts after present; otherwise pairwise then by length.
fn cmp_identifiers(a: &[Identifier], b: &[Identifier]) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a
            .iter()
            .zip(b)
            .map(|(x, y)| x.cmp(y))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len())),
    }
}

fn write_identifiers(f: &mut fmt::Formatter<'_>, lead: char, ids: &[Identifier]) -> fmt::Result {
    for (i, id) in ids.iter().enumerate() {
        if i == 0 {
            write!(f, "{lead}{id}")?;
        } else {
            write!(f, ".{id}")?;
        }
    }
    Ok(())
}
