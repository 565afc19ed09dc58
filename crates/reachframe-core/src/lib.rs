//! Adoption-percentile frames over clustered browser populations, and the
//! pipeline that produces them from a usage export.

pub mod config;
pub mod engine;
pub mod frames;
pub mod report;

pub use config::EngineConfig;
pub use engine::{Engine, UsageInput, UsageRecord};
pub use frames::{Frame, FrameBuilder};
pub use report::{FeatureUsage, Report, Stats, UnsupportedCluster};
