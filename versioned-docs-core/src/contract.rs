//! # contract: the seams between the orchestrator and the outside world
//!
//! Two traits isolate everything the core does not own:
//! - [`BranchHost`]: the remote source-control host (branch listing and file
//!   contents at a ref). Implemented by [`crate::github::GitHubClient`].
//! - [`CommandRunner`]: blocking execution of external tools. Implemented by
//!   [`crate::pipeline::SystemCommandRunner`].
//!
//! Both are annotated for `mockall`, so tests drive the whole pipeline with
//! `MockBranchHost` / `MockCommandRunner` instead of the network and real
//! toolchains.

use async_trait::async_trait;
use mockall::automock;

use crate::error::Result;
use crate::pipeline::CommandSpec;

/// A file as returned by the host's "get content at ref" operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    /// Raw payload, possibly encoded.
    pub content: String,
    /// Encoding of `content` as reported by the host (e.g. `base64`).
    pub encoding: Option<String>,
}

/// Read-only access to one upstream repository on a source-control host.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait BranchHost: Send + Sync {
    /// Names of all branches, in the order the host returns them.
    async fn list_branches(&self) -> Result<Vec<String>>;

    /// Contents of `path` at `reference`.
    async fn file_content(&self, path: &str, reference: &str) -> Result<FileContent>;
}

/// Runs one external command to completion with inherited stdio.
///
/// Implementations must turn a non-zero exit into an error; there is no
/// "soft failure" channel.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> Result<()>;
}
