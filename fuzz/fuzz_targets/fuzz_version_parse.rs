#![no_main]

//! Fuzz the version grammar.
//!
//! Two strategies:
//! 1. Arbitrary text -> `Version::parse` must not panic (may return Err).
//! 2. Structured components -> render, parse, render again must be stable.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use reachframe_types::Version;

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    /// Raw text for crash detection.
    raw: String,
    /// Numeric segments for the structured round-trip.
    numbers: Vec<u32>,
    prerelease: Option<u16>,
}

fuzz_target!(|input: FuzzInput| {
    // Strategy 1: raw text must not panic the parser.
    if let Ok(version) = Version::parse(&input.raw) {
        let rendered = version.to_string();
        let reparsed = Version::parse(&rendered).expect("canonical form must parse");
        assert_eq!(version, reparsed);
    }

    // Strategy 2: well-formed text parses and renders canonically.
    if input.numbers.is_empty() || input.numbers.len() > 8 {
        return;
    }
    let mut text = input
        .numbers
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(".");
    if let Some(pre) = input.prerelease {
        text.push_str(&format!("-rc.{pre}"));
    }
    let version = Version::parse(&text).expect("generated text must parse");
    assert_eq!(version.major, u64::from(input.numbers[0]));
    assert_eq!(version.is_prerelease(), input.prerelease.is_some());
    assert!(version.release() >= version);
});
