use thiserror::Error;

/// Primary error type for reachframe operations.
///
/// Per-record failures (`InvalidVersion`, `UnresolvableBrowser`,
/// `UnknownFeatureName`) are recoverable inside a run: the engine excludes the
/// offending record or watch-list entry and keeps going. Everything else
/// aborts the run.
#[derive(Error, Debug)]
pub enum ReachError {
    // === Version Errors ===
    /// Text does not match the extended semantic-version grammar.
    #[error("invalid version: '{text}'")]
    InvalidVersion { text: String },

    /// Text is not a `low` or `low-high` version range.
    #[error("invalid version range: '{text}'")]
    InvalidRange { text: String },

    // === Resolution Errors ===
    /// Normalization found no mapping or no acceptable version candidate.
    #[error("cannot resolve browser '{name}' version '{version}': {reason}")]
    UnresolvableBrowser {
        name: String,
        version: String,
        reason: String,
    },

    /// The capability database has no agent with this identifier.
    #[error("unknown browser id: {id}")]
    UnknownBrowserId { id: String },

    /// A watch-list entry names a feature absent from the capability database.
    #[error("unknown feature: {name}")]
    UnknownFeatureName { name: String },

    // === Configuration and Data Errors ===
    /// Engine configuration failed validation.
    #[error("invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    /// Capability snapshot is structurally unusable.
    #[error("invalid capability data: {detail}")]
    InvalidCapabilityData { detail: String },

    /// Input document could not be decoded.
    #[error("decode error: {detail}")]
    Decode { detail: String },

    // === I/O Errors ===
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Internal Errors ===
    /// Internal logic error (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`ReachError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed caller input (version text, ranges).
    Input,
    /// Browser or feature lookup failed.
    Resolution,
    /// Engine configuration rejected.
    Config,
    /// Capability data or usage document unusable.
    Data,
    /// Filesystem failure.
    Io,
    /// Bug.
    Internal,
}

impl ReachError {
    /// Classify this error.
    #[allow(clippy::match_same_arms)]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidVersion { .. } | Self::InvalidRange { .. } => ErrorKind::Input,
            Self::UnresolvableBrowser { .. }
            | Self::UnknownBrowserId { .. }
            | Self::UnknownFeatureName { .. } => ErrorKind::Resolution,
            Self::InvalidConfig { .. } => ErrorKind::Config,
            Self::InvalidCapabilityData { .. } | Self::Decode { .. } => ErrorKind::Data,
            Self::Io(_) => ErrorKind::Io,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the engine excludes the affected record (or watch-list entry)
    /// and continues the run instead of failing it.
    pub const fn is_record_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidVersion { .. }
                | Self::UnresolvableBrowser { .. }
                | Self::UnknownFeatureName { .. }
        )
    }

    /// Human-friendly suggestion for fixing this error.
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::InvalidVersion { .. } => {
                Some("Versions look like MAJOR[.MINOR[.PATCH[.BUILD]]][-PRERELEASE][+META]")
            }
            Self::InvalidRange { .. } => Some("Ranges are a single version or LOW-HIGH"),
            Self::UnresolvableBrowser { .. } => {
                Some("Add the browser to the normalization table or update the capability data")
            }
            Self::UnknownFeatureName { .. } => {
                Some("Check the feature name against the capability database")
            }
            Self::InvalidConfig { .. } => {
                Some("Thresholds must be positive, finite and strictly increasing")
            }
            _ => None,
        }
    }

    /// Get the process exit code for this error (for CLI use).
    pub const fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Input => 65,
            ErrorKind::Resolution | ErrorKind::Data => 66,
            ErrorKind::Config => 78,
            ErrorKind::Io => 74,
            ErrorKind::Internal => 70,
        }
    }

    /// Create an invalid-version error.
    pub fn invalid_version(text: impl Into<String>) -> Self {
        Self::InvalidVersion { text: text.into() }
    }

    /// Create an invalid-range error.
    pub fn invalid_range(text: impl Into<String>) -> Self {
        Self::InvalidRange { text: text.into() }
    }

    /// Create an unresolvable-browser error.
    pub fn unresolvable(
        name: impl Into<String>,
        version: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnresolvableBrowser {
            name: name.into(),
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid-configuration error.
    pub fn config(detail: impl Into<String>) -> Self {
        Self::InvalidConfig {
            detail: detail.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(detail: impl Into<String>) -> Self {
        Self::Decode {
            detail: detail.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using `ReachError`.
pub type Result<T> = std::result::Result<T, ReachError>;
