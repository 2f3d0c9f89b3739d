//! Error taxonomy for the orchestrator.
//!
//! Every failure is fatal: nothing in the core catches and recovers an
//! [`OrchestratorError`]. Callers propagate with `?` up to the CLI, which maps
//! any error to a non-zero exit status.

use std::path::PathBuf;

use crate::pipeline::BuildStep;

pub type Result<T, E = OrchestratorError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// Transport-level failure talking to the source-control host.
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The host answered with a non-success status.
    #[error("{url} returned HTTP {status}: {body}")]
    Api {
        url: String,
        status: u16,
        body: String,
    },

    #[error("no branch of {repo} matched the main-line name or the version pattern")]
    NoBranches { repo: String },

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("could not decode {path} on {branch}: {reason}")]
    Decode {
        branch: String,
        path: String,
        reason: String,
    },

    #[error("no <{tag}> element found in {path} on {branch}")]
    VersionTagMissing {
        branch: String,
        path: String,
        tag: String,
    },

    #[error("version {version:?} on {branch} has no numeric major component")]
    InvalidVersion { branch: String, version: String },

    #[error("main-line branch {branch} is not among the discovered versions")]
    MainBranchMissing { branch: String },

    #[error("{step} step failed: `{program}` exited with {status}")]
    CommandFailed {
        step: BuildStep,
        program: String,
        status: String,
    },

    #[error("{step} step could not launch `{program}`: {source}")]
    Spawn {
        step: BuildStep,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error for {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl OrchestratorError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OrchestratorError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
