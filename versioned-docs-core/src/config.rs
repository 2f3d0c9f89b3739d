use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Static settings, normally read from the YAML config file.
///
/// Every section falls back to the values the docs site has always used, so an
/// empty file (or no file) yields a working configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub upstream: UpstreamRepo,
    pub site: SiteLayout,
    pub toolchain: Toolchain,
    /// Pins the api level shown for the main-line branch while a major
    /// version bump is in progress upstream. `None` uses its major version.
    pub main_api_level: Option<u32>,
}

/// The source repository whose branches are documented.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamRepo {
    pub owner: String,
    pub repo: String,
    pub main_branch: String,
    pub version_branch_pattern: String,
    /// File, relative to the repository root, that declares the version.
    pub version_file: String,
    /// Element name wrapping the dotted version inside `version_file`.
    pub version_tag: String,
    pub api_base_url: String,
    /// Overrides the `https://github.com/{owner}/{repo}` clone URL.
    pub clone_url: Option<String>,
}

impl Default for UpstreamRepo {
    fn default() -> Self {
        Self {
            owner: "goatcorp".into(),
            repo: "Dalamud".into(),
            main_branch: "master".into(),
            version_branch_pattern: r"^v[0-9.]+$".into(),
            version_file: "Dalamud/Dalamud.csproj".into(),
            version_tag: "DalamudVersion".into(),
            api_base_url: "https://api.github.com".into(),
            clone_url: None,
        }
    }
}

impl UpstreamRepo {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    pub fn clone_url(&self) -> String {
        self.clone_url
            .clone()
            .unwrap_or_else(|| format!("https://github.com/{}/{}", self.owner, self.repo))
    }
}

/// Where the site lives and how its versioned inputs are named.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteLayout {
    pub root: PathBuf,
    pub versions_file: String,
    pub version_config_file: String,
    pub versioned_docs_dir: String,
    pub versioned_sidebars_dir: String,
    pub placeholder_sidebar: String,
    /// Converter configuration file, relative to `root`.
    pub converter_config: String,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            versions_file: "api_versions.json".into(),
            version_config_file: "dalamud-versions.json".into(),
            versioned_docs_dir: "api_versioned_docs".into(),
            versioned_sidebars_dir: "api_versioned_sidebars".into(),
            placeholder_sidebar: "version-placeholder-sidebars.json".into(),
            converter_config: "dfmg-config.yml".into(),
        }
    }
}

impl SiteLayout {
    pub fn versions_path(&self) -> PathBuf {
        self.root.join(&self.versions_file)
    }

    pub fn version_config_path(&self) -> PathBuf {
        self.root.join(&self.version_config_file)
    }

    pub fn docs_dir_for(&self, branch: &str) -> PathBuf {
        self.root
            .join(&self.versioned_docs_dir)
            .join(format!("version-{branch}"))
    }

    pub fn sidebars_dir(&self) -> PathBuf {
        self.root.join(&self.versioned_sidebars_dir)
    }

    pub fn placeholder_sidebar_path(&self) -> PathBuf {
        self.sidebars_dir().join(&self.placeholder_sidebar)
    }

    pub fn sidebar_file_for(&self, branch: &str) -> PathBuf {
        self.sidebars_dir()
            .join(format!("version-{branch}-sidebars.json"))
    }

    pub fn converter_config_path(&self) -> PathBuf {
        self.root.join(&self.converter_config)
    }

    /// Resolves a relative `root` against `base`. The converter runs inside
    /// the checkout, so every path handed to it must be absolute.
    pub fn anchored_at(mut self, base: &Path) -> Self {
        if self.root.is_relative() {
            self.root = self
                .root
                .components()
                .filter(|c| !matches!(c, Component::CurDir))
                .fold(base.to_path_buf(), |acc, c| acc.join(c));
        }
        self
    }
}

/// External tools driven for each branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Toolchain {
    pub build_target: String,
    pub build_configuration: String,
    pub metadata_command: Vec<String>,
    pub converter_command: Vec<String>,
    /// Directory inside the checkout where the metadata tool writes its output.
    pub metadata_output_dir: String,
    pub site_build_command: Vec<String>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            build_target: "CompileDalamud".into(),
            build_configuration: "Release".into(),
            metadata_command: vec!["docfx".into(), "metadata".into()],
            converter_command: vec!["dfmg".into()],
            metadata_output_dir: "api".into(),
            site_build_command: vec!["pnpm".into(), "run".into(), "build".into()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Windows,
    Unix,
}

impl HostPlatform {
    pub fn detect() -> Self {
        if cfg!(windows) {
            HostPlatform::Windows
        } else {
            HostPlatform::Unix
        }
    }
}

/// Temp-root variables, highest priority first.
pub const TEMP_DIR_VARS: [&str; 2] = ["RUNNER_TEMP", "TEMP"];
pub const FALLBACK_TEMP_DIR: &str = "/tmp";
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Snapshot of the process environment, taken once at startup.
#[derive(Clone)]
pub struct RunEnvironment {
    pub github_token: Option<String>,
    pub temp_root: PathBuf,
    pub platform: HostPlatform,
}

impl std::fmt::Debug for RunEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunEnvironment")
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("temp_root", &self.temp_root)
            .field("platform", &self.platform)
            .finish()
    }
}

impl RunEnvironment {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the snapshot from an arbitrary variable lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let temp_root = TEMP_DIR_VARS
            .iter()
            .find_map(|&key| get(key))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(FALLBACK_TEMP_DIR));
        Self {
            github_token: get(TOKEN_VAR),
            temp_root,
            platform: HostPlatform::detect(),
        }
    }
}

/// Everything a run needs, built once and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub settings: Settings,
    pub env: RunEnvironment,
}

impl Config {
    pub fn new(settings: Settings, env: RunEnvironment) -> Self {
        Self { settings, env }
    }

    pub fn upstream(&self) -> &UpstreamRepo {
        &self.settings.upstream
    }

    pub fn site(&self) -> &SiteLayout {
        &self.settings.site
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.settings.toolchain
    }

    pub fn trace_loaded(&self) {
        info!(
            upstream = %self.upstream().full_name(),
            main_branch = %self.upstream().main_branch,
            site_root = %self.site().root.display(),
            temp_root = %self.env.temp_root.display(),
            platform = ?self.env.platform,
            token_set = self.env.github_token.is_some(),
            "Loaded Config"
        );
        debug!(?self, "Config loaded (full debug)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn temp_root_prefers_runner_temp() {
        let env = RunEnvironment::from_lookup(lookup(&[
            ("RUNNER_TEMP", "/runner"),
            ("TEMP", "/temp"),
        ]));
        assert_eq!(env.temp_root, PathBuf::from("/runner"));
    }

    #[test]
    fn temp_root_falls_back_to_temp_then_default() {
        let env = RunEnvironment::from_lookup(lookup(&[("TEMP", "/temp")]));
        assert_eq!(env.temp_root, PathBuf::from("/temp"));

        let env = RunEnvironment::from_lookup(lookup(&[("RUNNER_TEMP", "")]));
        assert_eq!(env.temp_root, PathBuf::from(FALLBACK_TEMP_DIR));
    }

    #[test]
    fn token_is_redacted_in_debug_output() {
        let env = RunEnvironment::from_lookup(lookup(&[("GITHUB_TOKEN", "ghp_secret")]));
        assert_eq!(env.github_token.as_deref(), Some("ghp_secret"));
        assert!(!format!("{env:?}").contains("ghp_secret"));
    }

    #[test]
    fn site_paths_are_keyed_by_branch() {
        let site = SiteLayout::default().anchored_at(Path::new("/site"));
        assert_eq!(
            site.docs_dir_for("v9").display().to_string(),
            "/site/api_versioned_docs/version-v9"
        );
        assert_eq!(
            site.sidebar_file_for("master").display().to_string(),
            "/site/api_versioned_sidebars/version-master-sidebars.json"
        );
    }

    #[test]
    fn anchoring_drops_current_dir_segments() {
        let site = SiteLayout {
            root: PathBuf::from("./docs/./site"),
            ..SiteLayout::default()
        }
        .anchored_at(Path::new("/work"));
        assert_eq!(site.root.display().to_string(), "/work/docs/site");

        let absolute = SiteLayout {
            root: PathBuf::from("/elsewhere"),
            ..SiteLayout::default()
        }
        .anchored_at(Path::new("/work"));
        assert_eq!(absolute.root, PathBuf::from("/elsewhere"));
    }
}
