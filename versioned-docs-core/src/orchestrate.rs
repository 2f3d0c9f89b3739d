//! High-level pipeline: orchestrates discover → classify → build → site build.
//!
//! This module provides the top-level driver for a full versioned docs run:
//!   - Discovers the main-line and version branches of the upstream repository
//!   - Extracts the major version of every branch (all of them, before any build)
//!   - Classifies and persists the version metadata for the site generator
//!   - Builds the documentation of each branch, in discovery order
//!   - Runs the site build
//!
//! # Major Types
//! - [`RunReport`]: what was classified and where each branch's outputs landed
//!
//! # Responsibilities
//! - Fail-fast orchestration: the first error of any stage ends the run
//! - The build order (discovery order) and the table order (latest first) are
//!   computed independently and serve different consumers
//!
//! # Callable From
//! - The CLI crate and the integration tests, with real or mocked
//!   [`BranchHost`] / [`CommandRunner`] implementations
//!
//! # Navigation
//! - Main entrypoint: [`run`]
//! - Metadata only: [`refresh_versions`]

use tracing::info;

use crate::classify::{self, VersionTable};
use crate::config::Config;
use crate::contract::{BranchHost, CommandRunner};
use crate::error::Result;
use crate::pipeline::{BuildArtifact, BuildPipeline};
use crate::site;
use crate::version_source::{self, Branch};

#[derive(Debug)]
pub struct RunReport {
    pub table: VersionTable,
    pub artifacts: Vec<BuildArtifact>,
}

async fn discover_and_classify<H>(config: &Config, host: &H) -> Result<(Vec<Branch>, VersionTable)>
where
    H: BranchHost + ?Sized,
{
    let upstream = config.upstream();
    info!(repo = %upstream.full_name(), "[RUN] Discovering branches");
    let branches = version_source::discover_branches(host, upstream).await?;

    let records = version_source::collect_versions(host, upstream, &branches).await?;
    let table = classify::classify(&records, &upstream.main_branch, config.settings.main_api_level)?;
    classify::persist(&table, config.site())?;
    Ok((branches, table))
}

/// Discovers, classifies and writes the version metadata without building.
pub async fn refresh_versions<H>(config: &Config, host: &H) -> Result<VersionTable>
where
    H: BranchHost + ?Sized,
{
    let (_, table) = discover_and_classify(config, host).await?;
    info!(versions = ?table.known_versions(), "[RUN] Version metadata refreshed");
    Ok(table)
}

pub async fn run<H, R>(config: &Config, host: &H, runner: &R) -> Result<RunReport>
where
    H: BranchHost + ?Sized,
    R: CommandRunner + ?Sized,
{
    info!("[RUN] Starting versioned docs build");
    let (branches, table) = discover_and_classify(config, host).await?;

    let pipeline = BuildPipeline::new(config, runner);
    let artifacts = pipeline.build_all(&branches)?;

    site::build_site(runner, config)?;

    info!(branches = artifacts.len(), "[RUN] Versioned docs build complete");
    Ok(RunReport { table, artifacts })
}
