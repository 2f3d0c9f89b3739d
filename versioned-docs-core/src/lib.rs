#![doc = "versioned-docs-core: core logic library for versioned-docs."]

//! This crate contains the business logic of the versioned API docs build:
//! branch discovery, version classification, the per-branch build pipeline
//! and the final site build. The CLI crate only parses arguments and config.
//!
//! # Usage
//! Build a [`config::Config`], pick a [`contract::BranchHost`] (normally
//! [`github::GitHubClient`]) and a [`contract::CommandRunner`] (normally
//! [`pipeline::SystemCommandRunner`]), then call [`orchestrate::run`].

pub mod classify;
pub mod config;
pub mod contract;
pub mod error;
pub mod github;
pub mod orchestrate;
pub mod pipeline;
pub mod site;
pub mod version_source;

pub use error::{OrchestratorError, Result};
