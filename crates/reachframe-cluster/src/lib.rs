//! Clustering of normalized browser populations: first by version, then by
//! identical resolved feature set.

pub mod cluster;
pub mod features;
pub mod level;
pub mod versions;

pub use cluster::{Cluster, Membership};
pub use features::{FeatureClusterer, cluster_resolved};
pub use level::ClusterLevel;
pub use versions::VersionClusterer;
