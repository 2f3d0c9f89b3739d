//! Per-branch documentation build: clone → compile → extract metadata →
//! convert to markdown → place sidebar.
//!
//! # Responsibilities
//! - Describe every external invocation as a [`CommandSpec`] and hand it to a
//!   [`CommandRunner`]; nothing here spawns processes directly except
//!   [`SystemCommandRunner`].
//! - Own all writes below the versioned docs and versioned sidebars
//!   directories of the site.
//!
//! # Error Handling
//! Any failed step ends the branch and, through [`BuildPipeline::build_all`],
//! the whole queue. Nothing is retried and partial outputs are left in place.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, info};

use crate::config::{Config, HostPlatform};
use crate::contract::CommandRunner;
use crate::error::{OrchestratorError, Result};
use crate::version_source::Branch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Clone,
    Compile,
    ExtractMetadata,
    ConvertDocs,
    SiteBuild,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStep::Clone => "clone",
            BuildStep::Compile => "compile",
            BuildStep::ExtractMetadata => "metadata",
            BuildStep::ConvertDocs => "convert",
            BuildStep::SiteBuild => "site build",
        };
        f.write_str(name)
    }
}

/// A fully described external invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub step: BuildStep,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Added on top of the inherited environment.
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(step: BuildStep, program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            step,
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            envs: Vec::new(),
        }
    }

    /// First element is the program, the rest are arguments.
    pub fn from_argv(step: BuildStep, argv: &[String], cwd: impl Into<PathBuf>) -> Self {
        let (program, args): (&str, &[String]) = match argv.split_first() {
            Some((p, a)) => (p.as_str(), a),
            None => ("", &[]),
        };
        Self::new(step, program, cwd).args(args.iter().cloned())
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.envs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Spawns real processes with inherited stdio and waits for them.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, spec: &CommandSpec) -> Result<()> {
        info!(
            step = %spec.step,
            cwd = %spec.cwd.display(),
            command = %spec.command_line(),
            "Running external command"
        );
        let status = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .envs(spec.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .status();

        match status {
            Ok(s) if s.success() => {
                debug!(step = %spec.step, status = ?s, "External command succeeded");
                Ok(())
            }
            Ok(s) => {
                error!(
                    step = %spec.step,
                    command = %spec.command_line(),
                    "Command exited with non-zero code: {}", s
                );
                Err(OrchestratorError::CommandFailed {
                    step: spec.step,
                    program: spec.program.clone(),
                    status: s.to_string(),
                })
            }
            Err(e) => {
                error!(error = ?e, step = %spec.step, program = %spec.program, "Failed to launch process");
                Err(OrchestratorError::Spawn {
                    step: spec.step,
                    program: spec.program.clone(),
                    source: e,
                })
            }
        }
    }
}

/// Where one branch's outputs ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub branch: String,
    pub checkout_dir: PathBuf,
    pub docs_dir: PathBuf,
    pub sidebar_file: PathBuf,
}

pub struct BuildPipeline<'a, R: CommandRunner + ?Sized> {
    config: &'a Config,
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> BuildPipeline<'a, R> {
    pub fn new(config: &'a Config, runner: &'a R) -> Self {
        Self { config, runner }
    }

    pub fn checkout_dir(&self, branch: &str) -> PathBuf {
        self.config
            .env
            .temp_root
            .join(format!("{}-{}", self.config.upstream().repo, branch))
    }

    pub fn clone_command(&self, branch: &str) -> CommandSpec {
        let dir_name = format!("{}-{}", self.config.upstream().repo, branch);
        CommandSpec::new(BuildStep::Clone, "git", &self.config.env.temp_root)
            .args(["clone", "--recursive", "--depth", "1", "--branch"])
            .arg(branch)
            .arg(self.config.upstream().clone_url())
            .arg(dir_name)
    }

    pub fn compile_command(&self, checkout: &Path) -> CommandSpec {
        let tc = self.config.toolchain();
        match self.config.env.platform {
            HostPlatform::Windows => CommandSpec::new(BuildStep::Compile, "pwsh.exe", checkout)
                .args(["-NoProfile", "-File", ".\\build.ps1"])
                .arg(&tc.build_target)
                .arg("-Configuration")
                .arg(&tc.build_configuration),
            HostPlatform::Unix => CommandSpec::new(BuildStep::Compile, "bash", checkout)
                .arg("./build.sh")
                .arg(&tc.build_target)
                .arg("-Configuration")
                .arg(&tc.build_configuration)
                .arg("/p:EnableWindowsTargeting=true"),
        }
    }

    pub fn metadata_command(&self, checkout: &Path) -> CommandSpec {
        CommandSpec::from_argv(
            BuildStep::ExtractMetadata,
            &self.config.toolchain().metadata_command,
            checkout,
        )
    }

    pub fn convert_command(&self, branch: &str, checkout: &Path) -> CommandSpec {
        let site = self.config.site();
        let tc = self.config.toolchain();
        CommandSpec::from_argv(BuildStep::ConvertDocs, &tc.converter_command, checkout)
            .env("DFMG_CONFIG", site.converter_config_path().display().to_string())
            .env("DFMG_OUTPUT_PATH", site.docs_dir_for(branch).display().to_string())
            .env(
                "DFMG_YAML_PATH",
                checkout.join(&tc.metadata_output_dir).display().to_string(),
            )
    }

    /// Overwrites the branch's sidebar file with the placeholder.
    pub fn place_sidebar(&self, branch: &str) -> Result<PathBuf> {
        let site = self.config.site();
        let placeholder = site.placeholder_sidebar_path();
        let dest = site.sidebar_file_for(branch);
        fs::copy(&placeholder, &dest).map_err(|e| {
            error!(
                error = ?e,
                from = %placeholder.display(),
                to = %dest.display(),
                "Failed to copy placeholder sidebar"
            );
            OrchestratorError::io("failed to copy placeholder sidebar to", &dest, e)
        })?;
        debug!(path = %dest.display(), "Placed sidebar file");
        Ok(dest)
    }

    fn prepare_checkout(&self, checkout: &Path) -> Result<()> {
        let temp_root = &self.config.env.temp_root;
        if checkout.exists() {
            fs::remove_dir_all(checkout).map_err(|e| {
                error!(error = ?e, path = %checkout.display(), "Failed to remove stale checkout");
                OrchestratorError::io("failed to remove stale checkout", checkout, e)
            })?;
            debug!(path = %checkout.display(), "Removed stale checkout");
        } else if !temp_root.exists() {
            fs::create_dir_all(temp_root)
                .map_err(|e| OrchestratorError::io("failed to create temp root", temp_root, e))?;
        }
        Ok(())
    }

    fn reset_docs_dir(&self, docs_dir: &Path) -> Result<()> {
        if docs_dir.exists() {
            fs::remove_dir_all(docs_dir).map_err(|e| {
                error!(error = ?e, path = %docs_dir.display(), "Failed to clear previous docs output");
                OrchestratorError::io("failed to clear previous docs output", docs_dir, e)
            })?;
            debug!(path = %docs_dir.display(), "Cleared previous docs output");
        }
        Ok(())
    }

    pub fn build(&self, branch: &Branch) -> Result<BuildArtifact> {
        let name = branch.name.as_str();
        info!(branch = name, "==> Generating API documentation for branch");

        let checkout = self.checkout_dir(name);
        self.prepare_checkout(&checkout)?;
        self.runner.run(&self.clone_command(name))?;
        self.runner.run(&self.compile_command(&checkout))?;
        self.runner.run(&self.metadata_command(&checkout))?;

        let docs_dir = self.config.site().docs_dir_for(name);
        self.reset_docs_dir(&docs_dir)?;
        self.runner.run(&self.convert_command(name, &checkout))?;

        let sidebar_file = self.place_sidebar(name)?;

        info!(branch = name, docs = %docs_dir.display(), "==> Finished generating API documentation for branch");
        Ok(BuildArtifact {
            branch: name.to_string(),
            checkout_dir: checkout,
            docs_dir,
            sidebar_file,
        })
    }

    /// Builds every branch in order. The first failure stops the queue.
    pub fn build_all(&self, branches: &[Branch]) -> Result<Vec<BuildArtifact>> {
        let mut artifacts = Vec::with_capacity(branches.len());
        for branch in branches {
            artifacts.push(self.build(branch)?);
        }
        info!(count = artifacts.len(), "API doc generation complete");
        Ok(artifacts)
    }
}
