///
/// This module implements the CLI for versioned-docs: command parsing and the
/// async entrypoint used by `main` and the integration tests.
///
/// All business logic (discovery, classification, build pipeline) lives in the
/// [`versioned-docs-core`] crate. This module is strictly CLI glue.
///
/// ## Commands
/// - `build`: full run, from branch discovery to the site build.
/// - `versions`: only refresh the two version metadata files.
///
/// [`versioned-docs-core`]: ../../versioned-docs-core/
use crate::load_config::load_config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use versioned_docs_core::github::GitHubClient;
use versioned_docs_core::orchestrate;
use versioned_docs_core::pipeline::SystemCommandRunner;

/// Builds the multi-version API reference for the docs site.
#[derive(Parser)]
#[clap(
    name = "versioned-docs",
    version,
    about = "Discover release branches, build their API docs and assemble the versioned site"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the docs of every version branch, then the site
    Build {
        /// Path to the YAML config file (defaults apply when omitted)
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Only regenerate the version list and version labels
    Versions {
        /// Path to the YAML config file (defaults apply when omitted)
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Build { config } => {
            let config = load_config(config.as_deref())?;
            tracing::info!(command = "build", "Starting versioned docs build");
            let host = GitHubClient::from_config(&config);
            match orchestrate::run(&config, &host, &SystemCommandRunner).await {
                Ok(report) => {
                    tracing::info!(
                        command = "build",
                        versions = ?report.table.known_versions(),
                        built = report.artifacts.len(),
                        "Build complete"
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "build", error = %e, "Build failed");
                    Err(e.into())
                }
            }
        }
        Commands::Versions { config } => {
            let config = load_config(config.as_deref())?;
            tracing::info!(command = "versions", "Refreshing version metadata");
            let host = GitHubClient::from_config(&config);
            let table = orchestrate::refresh_versions(&config, &host)
                .await
                .map_err(|e| {
                    tracing::error!(command = "versions", error = %e, "Version refresh failed");
                    anyhow::Error::from(e)
                })?;
            for (branch, entry) in table.version_entries() {
                println!("{branch}: {}", entry.label);
            }
            Ok(())
        }
    }
}
