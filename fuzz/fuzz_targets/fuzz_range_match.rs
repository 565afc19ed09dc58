#![no_main]

//! Fuzz range parsing and matching. Neither may panic, and a version always
//! falls inside the two-bound range it spans.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use reachframe_types::{Version, VersionRange, matches_range};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    range: String,
    version: String,
    low: (u16, u16),
    high: (u16, u16),
}

fuzz_target!(|input: FuzzInput| {
    let _ = matches_range(input.version.as_str(), &input.range);
    if let Ok(range) = VersionRange::parse(&input.range) {
        if range.high.is_none() {
            assert_eq!(range.floor(), range.ceiling());
        }
    }

    let (low, high) = if input.low <= input.high {
        (input.low, input.high)
    } else {
        (input.high, input.low)
    };
    let spanned = format!("{}.{}-{}.{}", low.0, low.1, high.0, high.1);
    let inside = Version::new(u64::from(low.0), u64::from(low.1), 7);
    assert!(matches_range(&inside, &spanned).expect("generated range must parse"));
});
