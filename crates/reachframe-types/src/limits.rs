/// Longest version text the parser accepts.
pub const MAX_VERSION_TEXT_LEN: usize = 256;

/// Most numeric segments a version may carry (major, minor, patch, build...).
/// Engine build strings such as `611.1.21.161.7` use five.
pub const MAX_NUMERIC_SEGMENTS: usize = 8;

/// Default adoption thresholds, as a share of adjusted total users.
/// The terminal `1.0` catches every remaining user.
pub const DEFAULT_THRESHOLDS: [f64; 7] = [0.95, 0.97, 0.99, 0.995, 0.997, 0.999, 1.0];

/// Leading character of a "supported" flag in capability data (`y`, `y x`, `y #1`).
pub const SUPPORTED_FLAG_PREFIX: char = 'y';
