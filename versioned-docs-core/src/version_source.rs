//! Branch discovery and major-version extraction.
//!
//! Discovery keeps the main-line branch plus every branch whose name matches
//! the version-branch pattern, in the order the host listed them. Extraction
//! reads the version file on each retained branch and keeps only the major
//! component of the declared version. There is no fallback version: a missing
//! file or tag aborts the run before any build work starts.

use base64::Engine;
use regex::Regex;
use tracing::{error, info, warn};

use crate::config::UpstreamRepo;
use crate::contract::{BranchHost, FileContent};
use crate::error::{OrchestratorError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    MainLine,
    VersionTag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
    pub kind: BranchKind,
}

impl Branch {
    pub fn main_line(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BranchKind::MainLine,
        }
    }

    pub fn version_tag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: BranchKind::VersionTag,
        }
    }

    pub fn is_main_line(&self) -> bool {
        self.kind == BranchKind::MainLine
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRecord {
    pub branch: Branch,
    pub major_version: u32,
}

pub fn compile_branch_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| OrchestratorError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Keeps the main-line branch and version-tagged branches, preserving input order.
pub fn filter_branches<I, S>(names: I, main_branch: &str, pattern: &Regex) -> Vec<Branch>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names
        .into_iter()
        .map(Into::into)
        .filter_map(|name: String| {
            if name == main_branch {
                Some(Branch::main_line(name))
            } else if pattern.is_match(&name) {
                Some(Branch::version_tag(name))
            } else {
                None
            }
        })
        .collect()
}

pub async fn discover_branches<H>(host: &H, upstream: &UpstreamRepo) -> Result<Vec<Branch>>
where
    H: BranchHost + ?Sized,
{
    let pattern = compile_branch_pattern(&upstream.version_branch_pattern)?;
    let names = host.list_branches().await?;
    let total = names.len();
    let branches = filter_branches(names, &upstream.main_branch, &pattern);

    if branches.is_empty() {
        error!(repo = %upstream.full_name(), total, "No branches matched the retention policy");
        return Err(OrchestratorError::NoBranches {
            repo: upstream.full_name(),
        });
    }
    if !branches.iter().any(Branch::is_main_line) {
        warn!(main_branch = %upstream.main_branch, "Main-line branch not present on host");
    }
    info!(
        total,
        retained = branches.len(),
        branches = ?branches.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(),
        "Discovered branches"
    );
    Ok(branches)
}

/// Turns host file content into text. Base64 payloads may be line-wrapped.
pub fn decode_content(file: FileContent, branch: &str, path: &str) -> Result<String> {
    let decode_err = |reason: String| OrchestratorError::Decode {
        branch: branch.to_string(),
        path: path.to_string(),
        reason,
    };
    match file.encoding.as_deref() {
        Some(enc) if enc.eq_ignore_ascii_case("base64") => {
            let compact: String = file
                .content
                .chars()
                .filter(|c| !c.is_ascii_whitespace())
                .collect();
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| decode_err(e.to_string()))?;
            String::from_utf8(bytes).map_err(|e| decode_err(e.to_string()))
        }
        _ => Ok(file.content),
    }
}

/// Finds `<tag>X.Y.Z</tag>` in `text` and returns `X`.
pub fn extract_major_version(text: &str, tag: &str, branch: &str, path: &str) -> Result<u32> {
    let tag_pattern = format!(r"<{t}>([0-9.]+)</{t}>", t = regex::escape(tag));
    let re = Regex::new(&tag_pattern).map_err(|source| OrchestratorError::InvalidPattern {
        pattern: tag_pattern.clone(),
        source,
    })?;

    let version = re
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| OrchestratorError::VersionTagMissing {
            branch: branch.to_string(),
            path: path.to_string(),
            tag: tag.to_string(),
        })?;

    let major = version.split('.').next().unwrap_or_default();
    major
        .parse::<u32>()
        .map_err(|_| OrchestratorError::InvalidVersion {
            branch: branch.to_string(),
            version: version.to_string(),
        })
}

pub async fn extract_version<H>(
    host: &H,
    upstream: &UpstreamRepo,
    branch: &Branch,
) -> Result<VersionRecord>
where
    H: BranchHost + ?Sized,
{
    let path = upstream.version_file.as_str();
    let file = host.file_content(path, &branch.name).await?;
    let text = decode_content(file, &branch.name, path)?;
    let major_version = extract_major_version(&text, &upstream.version_tag, &branch.name, path)
        .map_err(|e| {
            error!(branch = %branch.name, error = %e, "Version extraction failed");
            e
        })?;
    info!(branch = %branch.name, major_version, "Extracted major version");
    Ok(VersionRecord {
        branch: branch.clone(),
        major_version,
    })
}

/// One record per branch, in input order. The first failure aborts.
pub async fn collect_versions<H>(
    host: &H,
    upstream: &UpstreamRepo,
    branches: &[Branch],
) -> Result<Vec<VersionRecord>>
where
    H: BranchHost + ?Sized,
{
    let mut records = Vec::with_capacity(branches.len());
    for branch in branches {
        records.push(extract_version(host, upstream, branch).await?);
    }
    Ok(records)
}
