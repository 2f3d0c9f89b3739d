//! Version classification and the two JSON metadata files.
//!
//! Classification is pure: it orders the discovered records latest-first and
//! decides each entry's [`Channel`]. Label text is rendered separately by
//! [`label`], so the presentation can change without touching the rules.
//!
//! This module is the only writer of the known-versions list and the
//! version-configuration object consumed by the site generator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use crate::config::SiteLayout;
use crate::error::{OrchestratorError, Result};
use crate::version_source::{Branch, VersionRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Newer major than the main-line branch.
    Unreleased,
    /// The main-line branch.
    Current,
    /// Any older version branch.
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Banner {
    Unreleased,
    Unmaintained,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMetadata {
    pub branch: Branch,
    pub major_version: u32,
    pub api_level: u32,
    pub channel: Channel,
}

/// Latest-first version list. Majors are non-increasing from front to back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionTable {
    pub entries: Vec<VersionMetadata>,
}

/// One value of the version-configuration object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<Banner>,
}

/// Both metadata files as read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedVersions {
    pub known_versions: Vec<String>,
    pub version_config: BTreeMap<String, VersionEntry>,
}

pub fn classify(
    records: &[VersionRecord],
    main_branch: &str,
    main_api_level: Option<u32>,
) -> Result<VersionTable> {
    let main_major = records
        .iter()
        .find(|r| r.branch.name == main_branch)
        .map(|r| r.major_version)
        .ok_or_else(|| {
            error!(main_branch, "Main-line branch has no version record");
            OrchestratorError::MainBranchMissing {
                branch: main_branch.to_string(),
            }
        })?;

    let mut ordered: Vec<&VersionRecord> = records.iter().collect();
    // sort_by is stable: equal majors keep discovery order.
    ordered.sort_by(|a, b| b.major_version.cmp(&a.major_version));

    let entries = ordered
        .into_iter()
        .map(|record| {
            let is_main = record.branch.name == main_branch;
            let channel = if record.major_version > main_major {
                Channel::Unreleased
            } else if is_main {
                Channel::Current
            } else {
                Channel::Legacy
            };
            let api_level = match (is_main, main_api_level) {
                (true, Some(level)) => level,
                _ => record.major_version,
            };
            VersionMetadata {
                branch: record.branch.clone(),
                major_version: record.major_version,
                api_level,
                channel,
            }
        })
        .collect();

    let table = VersionTable { entries };
    debug!(?table, main_major, "Classified versions");
    Ok(table)
}

pub fn banner(meta: &VersionMetadata) -> Option<Banner> {
    match meta.channel {
        Channel::Unreleased => Some(Banner::Unreleased),
        Channel::Current => None,
        Channel::Legacy => Some(Banner::Unmaintained),
    }
}

pub fn label(meta: &VersionMetadata) -> String {
    let base = format!("{}.x (API {})", meta.major_version, meta.api_level);
    match meta.channel {
        Channel::Unreleased => format!("{base} 🚧"),
        Channel::Current => format!("{base} [Current]"),
        Channel::Legacy => format!("{base} [Legacy]"),
    }
}

impl VersionTable {
    pub fn known_versions(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.branch.name.clone()).collect()
    }

    /// Label and banner per branch, latest first.
    pub fn version_entries(&self) -> Vec<(String, VersionEntry)> {
        self.entries
            .iter()
            .map(|e| {
                (
                    e.branch.name.clone(),
                    VersionEntry {
                        label: label(e),
                        banner: banner(e),
                    },
                )
            })
            .collect()
    }

    pub fn version_config(&self) -> BTreeMap<String, VersionEntry> {
        self.version_entries().into_iter().collect()
    }

    pub fn is_latest_first(&self) -> bool {
        self.entries
            .windows(2)
            .all(|w| w[0].major_version >= w[1].major_version)
    }
}

/// Serializes as a JSON object whose keys keep the table order.
struct OrderedConfig<'a>(&'a [(String, VersionEntry)]);

impl Serialize for OrderedConfig<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(branch, entry)| (branch, entry)))
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string(value).map_err(|source| OrchestratorError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| OrchestratorError::io("failed to create directory", parent, e))?;
    }
    fs::write(path, json).map_err(|e| {
        error!(error = ?e, path = %path.display(), "Failed to write metadata file");
        OrchestratorError::io("failed to write", path, e)
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).map_err(|e| OrchestratorError::io("failed to read", path, e))?;
    serde_json::from_str(&raw).map_err(|source| OrchestratorError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Overwrites both metadata files.
pub fn persist(table: &VersionTable, site: &SiteLayout) -> Result<()> {
    let versions_path = site.versions_path();
    let config_path = site.version_config_path();
    write_json(&versions_path, &table.known_versions())?;
    write_json(&config_path, &OrderedConfig(&table.version_entries()))?;
    info!(
        versions = %versions_path.display(),
        config = %config_path.display(),
        count = table.entries.len(),
        "Successfully updated version metadata files"
    );
    Ok(())
}

pub fn load_persisted(site: &SiteLayout) -> Result<PersistedVersions> {
    Ok(PersistedVersions {
        known_versions: read_json(&site.versions_path())?,
        version_config: read_json(&site.version_config_path())?,
    })
}
