/// `load_config` module: Loads the static YAML config and snapshots the environment into the core [`Config`].
///
/// This module is the only place where the YAML file is parsed and where the
/// process environment is read.
///
/// # Responsibilities
/// - Parse the optional YAML file into [`Settings`]; missing keys take the
///   defaults the docs site has always used
/// - Resolve a relative site root against the working directory
/// - Take the one-time [`RunEnvironment`] snapshot (token, temp root)
///
/// # Errors
/// All errors use `anyhow::Error` and surface at the CLI boundary.
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use versioned_docs_core::config::{Config, RunEnvironment, Settings};

/// Parses a YAML settings file. An empty file yields the defaults.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    if config_content.trim().is_empty() {
        return Ok(Settings::default());
    }

    match serde_yaml::from_str::<Settings>(&config_content) {
        Ok(settings) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(settings)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Combines the settings (from `path`, or defaults) with an environment snapshot.
pub fn load_config_with_env(path: Option<&Path>, env: RunEnvironment) -> Result<Config> {
    let mut settings = match path {
        Some(p) => load_settings(p)?,
        None => {
            info!("No config file given, using defaults");
            Settings::default()
        }
    };

    let cwd: PathBuf = std::env::current_dir().context("Failed to determine working directory")?;
    settings.site = settings.site.anchored_at(&cwd);

    let config = Config::new(settings, env);
    config.trace_loaded();
    Ok(config)
}

pub fn load_config(path: Option<&Path>) -> Result<Config> {
    load_config_with_env(path, RunEnvironment::from_env())
}
