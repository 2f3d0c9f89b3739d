#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use base64::Engine;
use tempfile::TempDir;
use versioned_docs_core::config::{Config, HostPlatform, RunEnvironment, Settings};
use versioned_docs_core::contract::{FileContent, MockBranchHost, MockCommandRunner};
use versioned_docs_core::pipeline::CommandSpec;

pub const PLACEHOLDER_SIDEBAR: &str = r#"{"apiSidebar":[{"type":"autogenerated","dirName":"."}]}"#;

/// A site root and temp root inside one temporary directory.
pub struct Fixture {
    pub dir: TempDir,
    pub config: Config,
}

pub fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut settings = Settings::default();
    settings.site.root = dir.path().join("site");
    let env = RunEnvironment {
        github_token: None,
        temp_root: dir.path().join("tmp"),
        platform: HostPlatform::Unix,
    };
    let config = Config::new(settings, env);

    let sidebars = config.site().sidebars_dir();
    fs::create_dir_all(&sidebars).unwrap();
    fs::write(config.site().placeholder_sidebar_path(), PLACEHOLDER_SIDEBAR).unwrap();
    Fixture { dir, config }
}

pub fn csproj(version: &str) -> String {
    format!(
        "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <PropertyGroup Label=\"Feature\">\n    <DalamudVersion>{version}</DalamudVersion>\n  </PropertyGroup>\n</Project>\n"
    )
}

/// Base64 wrapped at 60 columns, the way GitHub returns file contents.
pub fn github_encoded(text: &str) -> FileContent {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text);
    let wrapped = encoded
        .as_bytes()
        .chunks(60)
        .map(|c| std::str::from_utf8(c).unwrap())
        .collect::<Vec<_>>()
        .join("\n");
    FileContent {
        content: wrapped + "\n",
        encoding: Some("base64".into()),
    }
}

/// A host listing `branches` where each branch declares the paired version.
pub fn host_with(branches: &[(&str, &str)]) -> MockBranchHost {
    let names: Vec<String> = branches.iter().map(|(b, _)| b.to_string()).collect();
    let versions: Vec<(String, String)> = branches
        .iter()
        .map(|(b, v)| (b.to_string(), v.to_string()))
        .collect();

    let mut host = MockBranchHost::new();
    host.expect_list_branches()
        .returning(move || Ok(names.clone()));
    host.expect_file_content().returning(move |_path, reference| {
        let version = versions
            .iter()
            .find(|(b, _)| b == reference)
            .map(|(_, v)| v.clone())
            .expect("unexpected ref requested");
        Ok(github_encoded(&csproj(&version)))
    });
    host
}

/// A runner that records every command and emulates the converter by
/// writing one page into `DFMG_OUTPUT_PATH`.
pub fn recording_runner() -> (MockCommandRunner, Arc<Mutex<Vec<CommandSpec>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let log = calls.clone();
    let mut runner = MockCommandRunner::new();
    runner.expect_run().returning(move |spec| {
        log.lock().unwrap().push(spec.clone());
        if let Some(out) = spec.env_value("DFMG_OUTPUT_PATH") {
            write_page(Path::new(out));
        }
        Ok(())
    });
    (runner, calls)
}

pub fn write_page(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("index.md"), "# API\n").unwrap();
}
