//! Value types shared across reachframe: the extended version model, range
//! bounds, set algebra and normalized browser records.

pub mod limits;
pub mod range;
pub mod record;
pub mod set_ops;
pub mod version;

pub use range::{MissingSegments, Segment, VersionBound, VersionRange, matches_range};
pub use record::{BrowserRecord, OriginalBrowser};
pub use set_ops::FeatureSet;
pub use version::{Identifier, ToVersion, Version, compare, parse_if_needed};
