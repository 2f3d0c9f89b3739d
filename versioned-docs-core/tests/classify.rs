mod common;

use std::fs;

use common::fixture;
use versioned_docs_core::classify::{
    banner, classify, label, load_persisted, persist, Banner, Channel, VersionEntry,
};
use versioned_docs_core::error::OrchestratorError;
use versioned_docs_core::version_source::{Branch, VersionRecord};

fn record(branch: Branch, major_version: u32) -> VersionRecord {
    VersionRecord {
        branch,
        major_version,
    }
}

/// Majors [9, 8, 8, 6] in discovery order, main line at 8.
fn sample_records() -> Vec<VersionRecord> {
    vec![
        record(Branch::version_tag("v8"), 8),
        record(Branch::version_tag("v6"), 6),
        record(Branch::main_line("master"), 8),
        record(Branch::version_tag("v9"), 9),
    ]
}

#[test]
fn orders_latest_first_and_keeps_discovery_order_for_ties() {
    let table = classify(&sample_records(), "master", None).unwrap();

    assert_eq!(table.known_versions(), vec!["v9", "v8", "master", "v6"]);
    assert!(table.is_latest_first());
    let majors: Vec<u32> = table.entries.iter().map(|e| e.major_version).collect();
    assert_eq!(majors, vec![9, 8, 8, 6]);
}

#[test]
fn tie_order_follows_discovery_when_main_line_comes_first() {
    let records = vec![
        record(Branch::main_line("master"), 8),
        record(Branch::version_tag("v8"), 8),
    ];
    let table = classify(&records, "master", None).unwrap();
    assert_eq!(table.known_versions(), vec!["master", "v8"]);
}

#[test]
fn channels_are_relative_to_main_line() {
    let table = classify(&sample_records(), "master", None).unwrap();
    let channels: Vec<(&str, Channel)> = table
        .entries
        .iter()
        .map(|e| (e.branch.name.as_str(), e.channel))
        .collect();
    assert_eq!(
        channels,
        vec![
            ("v9", Channel::Unreleased),
            ("v8", Channel::Legacy),
            ("master", Channel::Current),
            ("v6", Channel::Legacy),
        ]
    );
}

#[test]
fn labels_and_banners_per_channel() {
    let table = classify(&sample_records(), "master", None).unwrap();
    let config = table.version_config();

    assert_eq!(
        config["v9"],
        VersionEntry {
            label: "9.x (API 9) 🚧".into(),
            banner: Some(Banner::Unreleased),
        }
    );
    assert_eq!(
        config["master"],
        VersionEntry {
            label: "8.x (API 8) [Current]".into(),
            banner: None,
        }
    );
    assert_eq!(
        config["v6"],
        VersionEntry {
            label: "6.x (API 6) [Legacy]".into(),
            banner: Some(Banner::Unmaintained),
        }
    );
    assert_eq!(banner(&table.entries[1]), Some(Banner::Unmaintained));
}

#[test]
fn main_line_api_level_override_only_touches_main_line() {
    let records = vec![
        record(Branch::main_line("master"), 9),
        record(Branch::version_tag("v8"), 8),
    ];
    let table = classify(&records, "master", Some(8)).unwrap();

    let master = &table.entries[0];
    assert_eq!(master.api_level, 8);
    assert_eq!(label(master), "9.x (API 8) [Current]");
    assert_eq!(table.entries[1].api_level, 8);
    assert_eq!(label(&table.entries[1]), "8.x (API 8) [Legacy]");
}

#[test]
fn missing_main_line_is_an_error() {
    let records = vec![record(Branch::version_tag("v9"), 9)];
    let err = classify(&records, "master", None).unwrap_err();
    assert!(matches!(err, OrchestratorError::MainBranchMissing { .. }));
}

#[test]
fn persisted_files_round_trip() {
    let fx = fixture();
    let site = fx.config.site();
    let table = classify(&sample_records(), "master", None).unwrap();

    persist(&table, site).unwrap();
    let loaded = load_persisted(site).unwrap();

    assert_eq!(loaded.known_versions, table.known_versions());
    assert_eq!(loaded.version_config, table.version_config());
}

#[test]
fn persisted_json_has_the_site_generator_shape() {
    let fx = fixture();
    let site = fx.config.site();
    let table = classify(&sample_records(), "master", None).unwrap();
    persist(&table, site).unwrap();

    let list: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(site.versions_path()).unwrap()).unwrap();
    assert_eq!(list, serde_json::json!(["v9", "v8", "master", "v6"]));

    let config: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(site.version_config_path()).unwrap()).unwrap();
    assert_eq!(config["v9"]["banner"], "unreleased");
    assert_eq!(config["v6"]["banner"], "unmaintained");
    assert!(config["master"].get("banner").is_none());
    assert_eq!(config["master"]["label"], "8.x (API 8) [Current]");
}

#[test]
fn persist_overwrites_previous_content() {
    let fx = fixture();
    let site = fx.config.site();
    fs::write(site.versions_path(), r#"["v1","v2","v3","v4","v5","v6","v7"]"#).unwrap();
    fs::write(site.version_config_path(), r#"{"v1":{"label":"old"}}"#).unwrap();

    let table = classify(&[record(Branch::main_line("master"), 10)], "master", None).unwrap();
    persist(&table, site).unwrap();

    let loaded = load_persisted(site).unwrap();
    assert_eq!(loaded.known_versions, vec!["master"]);
    assert_eq!(loaded.version_config.len(), 1);
    assert!(!loaded.version_config.contains_key("v1"));
}

#[test]
fn version_config_file_lists_entries_latest_first() {
    let fx = fixture();
    let site = fx.config.site();
    let table = classify(&sample_records(), "master", None).unwrap();
    persist(&table, site).unwrap();

    let raw = fs::read_to_string(site.version_config_path()).unwrap();
    let positions: Vec<usize> = ["\"v9\":", "\"v8\":", "\"master\":", "\"v6\":"]
        .iter()
        .map(|key| raw.find(key).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{raw}");

    let branches: Vec<String> = table.version_entries().into_iter().map(|(b, _)| b).collect();
    assert_eq!(branches, table.known_versions());
}
