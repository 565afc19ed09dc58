//! Public API facade for reachframe.
//!
//! Turns a browser-usage export plus a capability database into
//! adoption-percentile frames: at each threshold, the web features every
//! admitted browser supports, and how that set changed from the previous
//! threshold.

pub use reachframe_browser::{
    BrowserNormalizer, CapabilityDatabase, CapabilitySnapshot, EngineBuildTable,
    NormalizationTable, StaticCapabilityDb,
};
pub use reachframe_cluster::{
    Cluster, ClusterLevel, FeatureClusterer, Membership, VersionClusterer, cluster_resolved,
};
pub use reachframe_core::{
    Engine, EngineConfig, FeatureUsage, Frame, FrameBuilder, Report, Stats, UnsupportedCluster,
    UsageInput, UsageRecord,
};
pub use reachframe_error::{ErrorKind, ReachError, Result};
pub use reachframe_types::{
    BrowserRecord, FeatureSet, Identifier, OriginalBrowser, ToVersion, Version, VersionRange,
    compare, matches_range, parse_if_needed, set_ops,
};
