//! Browser identity: the capability-database query contract, the static
//! snapshot-backed database, and normalization of usage-export browser
//! names and versions onto database identifiers.

pub mod capability;
pub mod normalize;
pub mod tables;

pub use capability::{
    AgentSnapshot, CapabilityDatabase, CapabilitySnapshot, FeatureSnapshot, StaticCapabilityDb,
};
pub use normalize::BrowserNormalizer;
pub use tables::{EngineBuildTable, NormalizationTable};
