use std::collections::BTreeSet;

use proptest::prelude::*;
use reachframe::{
    ClusterLevel, Engine, EngineConfig, FeatureSet, NormalizationTable, StaticCapabilityDb,
    UsageInput, UsageRecord, Version, set_ops,
};
use serde_json::json;

fn features(items: &[&str]) -> FeatureSet {
    items.iter().map(|s| (*s).to_owned()).collect()
}

fn db_from(value: &serde_json::Value) -> StaticCapabilityDb {
    StaticCapabilityDb::from_json_str(&value.to_string()).expect("fixture decodes")
}

fn two_browser_db() -> StaticCapabilityDb {
    db_from(&json!({
        "agents": {
            "browsera": {"versions": ["10.0", "10.1"]},
            "browserb": {"versions": ["5.0"]}
        },
        "features": {
            "f1": {"title": "Feature one", "stats": {
                "browsera": {"10.0-10.1": "y"},
                "browserb": {"5.0": "y"}
            }},
            "f2": {"title": "Feature two", "stats": {
                "browsera": {"10.0-10.1": "y"},
                "browserb": {"5.0": "n"}
            }}
        }
    }))
}

fn two_browser_table() -> NormalizationTable {
    NormalizationTable::empty()
        .with_name("BrowserA", "browsera")
        .with_name("BrowserB", "browserb")
}

#[test]
fn two_browsers_two_thresholds() {
    let db = two_browser_db();
    let config = EngineConfig {
        thresholds: vec![0.75, 1.0],
        ..EngineConfig::default()
    };
    let engine = Engine::new(&db, two_browser_table(), config).unwrap();
    let input = UsageInput {
        total_users: Some(200),
        records: vec![
            UsageRecord::new("BrowserA", "10.0", 100),
            UsageRecord::new("BrowserA", "10.1", 50),
            UsageRecord::new("BrowserB", "5.0", 50),
        ],
    };
    let report = engine.run(&input).unwrap();

    assert_eq!(report.stats.adjusted_total_users, 200);
    assert_eq!(report.stats.unique_version_clusters, 3);
    assert_eq!(report.stats.unique_feature_clusters, 2);

    assert_eq!(report.frames.len(), 2);
    let first = &report.frames[0];
    assert_eq!(first.users, 150);
    assert_eq!(first.threshold, Some(0.75));
    assert_eq!(first.available, Some(features(&["f1", "f2"])));
    assert_eq!(first.cluster.browsers().collect::<Vec<_>>(), vec!["browsera"]);
    assert_eq!(
        first.cluster.versions("browsera").unwrap(),
        &[Version::new(10, 1, 0), Version::new(10, 0, 0)]
    );

    let last = &report.frames[1];
    assert_eq!(last.users, 200);
    assert_eq!(last.removed, Some(features(&["f2"])));
    assert_eq!(last.added, Some(FeatureSet::new()));
    assert_eq!(last.cluster.size(), 3);

    assert_eq!(
        report.feature_sets(),
        vec![features(&["f1", "f2"]), features(&["f1"])]
    );
    assert_eq!(report.feature_titles["f2"], "Feature two");
}

#[test]
fn report_json_shape() {
    let db = two_browser_db();
    let config = EngineConfig {
        thresholds: vec![0.75, 1.0],
        watch_features: vec!["f2".to_owned()],
        cluster_level: ClusterLevel::Full,
    };
    let engine = Engine::new(&db, two_browser_table(), config).unwrap();
    let report = engine
        .run(&UsageInput::new(vec![
            UsageRecord::new("BrowserA", "10.0", 150),
            UsageRecord::new("BrowserB", "5.0", 50),
        ]))
        .unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["stats"]["total_users"], 200);
    assert_eq!(value["frames"][0]["available"], json!(["f1", "f2"]));
    assert!(value["frames"][0].get("removed").is_none());
    assert_eq!(value["frames"][1]["removed"], json!(["f2"]));
    assert_eq!(value["frames"][1]["cluster"]["browserb"], json!(["5.0.0"]));
    assert_eq!(value["features"]["f2"]["users"], 150);
    assert_eq!(value["features"]["f2"]["unsupported"][0]["browser"], "browserb");
    assert_eq!(value["feature_titles"]["f1"], "Feature one");
}

#[test]
fn major_level_merges_point_releases() {
    let db = db_from(&json!({
        "agents": {"chrome": {"versions": ["120", "120.1", "120.2"]}},
        "features": {"grid": {"title": "Grid", "stats": {"chrome": {"120-121": "y"}}}}
    }));
    let config = EngineConfig {
        cluster_level: ClusterLevel::Major,
        ..EngineConfig::default()
    };
    let engine = Engine::new(&db, NormalizationTable::default(), config).unwrap();
    let report = engine
        .run(&UsageInput::new(vec![
            UsageRecord::new("Chrome", "120.0", 10),
            UsageRecord::new("Chrome", "120.1.5", 10),
            UsageRecord::new("Android Webview", "120.2", 10),
        ]))
        .unwrap();
    assert_eq!(report.stats.unique_version_clusters, 1);
    assert_eq!(report.frames.len(), 1);
    assert_eq!(report.frames[0].users, 30);
}

fn mixed_db() -> StaticCapabilityDb {
    db_from(&json!({
        "agents": {
            "chrome": {"versions": ["100", "110", "120"]},
            "firefox": {"versions": ["100", "115", "121"]},
            "safari": {"versions": ["10.1", "14.1", "16.2", "TP"]},
            "edge": {"versions": ["110", "120"]}
        },
        "features": {
            "grid": {"title": "Grid", "stats": {
                "chrome": {"100-120": "y"}, "firefox": {"100-121": "y"},
                "safari": {"10.1-16.2": "y"}, "edge": {"110-120": "y"}
            }},
            "has": {"title": ":has()", "stats": {
                "chrome": {"100-110": "n", "120": "y"}, "firefox": {"100-121": "n"},
                "safari": {"10.1-14.1": "n", "16.2": "y"}, "edge": {"110": "n", "120": "y"}
            }},
            "nesting": {"title": "Nesting", "stats": {
                "chrome": {"100-110": "n", "120": "y"}, "firefox": {"100-115": "n", "121": "y"},
                "safari": {"10.1-16.2": "n"}, "edge": {"110-120": "n"}
            }},
            "popover": {"title": "Popover", "stats": {
                "chrome": {"100-120": "n"}, "firefox": {"100-121": "n"},
                "safari": {"10.1-16.2": "n", "TP": "y"}, "edge": {"110-120": "n"}
            }}
        }
    }))
}

const NAMES: [&str; 5] = ["Chrome", "Firefox", "Safari", "Edge", "Netscape"];
const VERSIONS: [&str; 9] = [
    "100", "110.0.5481", "120.0.6099.71", "115.2", "121", "604.1.38", "16.2", "14.1.2", "oops",
];

fn arb_usage() -> impl Strategy<Value = Vec<UsageRecord>> {
    prop::collection::vec(
        (0..NAMES.len(), 0..VERSIONS.len(), 0_u64..10_000),
        0..30,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(name, version, users)| UsageRecord::new(NAMES[name], VERSIONS[version], users))
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn users_are_conserved(records in arb_usage()) {
        let db = mixed_db();
        let engine = Engine::with_defaults(&db).unwrap();
        let input = UsageInput::new(records);
        let report = engine.run(&input).unwrap();
        let stats = &report.stats;

        prop_assert_eq!(stats.total_users, input.total_users());
        prop_assert_eq!(stats.unknown_users + stats.adjusted_total_users, stats.total_users);
        prop_assert_eq!(stats.unknown_browsers.values().sum::<u64>(), stats.unknown_users);

        let admitted: u64 = report
            .frames
            .iter()
            .flat_map(|frame| frame.browsers.iter())
            .map(|record| record.users)
            .sum();
        prop_assert_eq!(admitted, stats.adjusted_total_users);
        let admitted_records = report.frames.iter().map(|frame| frame.browsers.len()).sum::<usize>();
        prop_assert_eq!(admitted_records, stats.unique_version_clusters);
    }

    #[test]
    fn frames_are_monotonic(records in arb_usage()) {
        let db = mixed_db();
        let engine = Engine::with_defaults(&db).unwrap();
        let report = engine.run(&UsageInput::new(records)).unwrap();

        for (index, frame) in report.frames.iter().enumerate() {
            prop_assert_eq!(frame.available.is_some(), index == 0);
            if let (Some(added), Some(removed)) = (&frame.added, &frame.removed) {
                prop_assert!(set_ops::is_disjoint_from(added, removed));
            }
        }
        for pair in report.frames.windows(2) {
            let (earlier, later) = (&pair[0], &pair[1]);
            prop_assert!(earlier.users <= later.users);
            prop_assert!(earlier.cluster.size() < later.cluster.size());
            for (browser, versions) in earlier.cluster.iter() {
                for version in versions {
                    prop_assert!(later.cluster.contains(browser, version));
                }
            }
        }

        let sets = report.feature_sets();
        for pair in sets.windows(2) {
            prop_assert!(set_ops::is_subset_of(&pair[1], &pair[0]));
        }
    }

    #[test]
    fn unknown_names_never_reach_frames(records in arb_usage()) {
        let db = mixed_db();
        let engine = Engine::with_defaults(&db).unwrap();
        let report = engine.run(&UsageInput::new(records)).unwrap();
        let browsers: BTreeSet<&str> = report
            .frames
            .iter()
            .flat_map(|frame| frame.cluster.browsers())
            .collect();
        prop_assert!(browsers.iter().all(|id| ["chrome", "firefox", "safari", "edge"].contains(id)));
        prop_assert!(report
            .stats
            .unknown_browsers
            .keys()
            .all(|key| NAMES.iter().any(|name| key.starts_with(name))));
    }
}
