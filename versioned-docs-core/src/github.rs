//! GitHub REST implementation of [`BranchHost`].

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::config::{Config, UpstreamRepo};
use crate::contract::{BranchHost, FileContent};
use crate::error::{OrchestratorError, Result};

/// Page size requested from the branches endpoint (the API maximum).
const BRANCHES_PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct BranchEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

pub struct GitHubClient {
    client: Client,
    api_base: String,
    owner: String,
    repo: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(upstream: &UpstreamRepo, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: upstream.api_base_url.trim_end_matches('/').to_string(),
            owner: upstream.owner.clone(),
            repo: upstream.repo.clone(),
            token,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let client = Self::new(config.upstream(), config.env.github_token.clone());
        info!(
            repo = %config.upstream().full_name(),
            api_base = %client.api_base,
            authenticated = client.token.is_some(),
            "Initialized GitHub client"
        );
        client
    }

    fn branches_url(&self, page: usize) -> String {
        format!(
            "{}/repos/{}/{}/branches?per_page={}&page={}",
            self.api_base, self.owner, self.repo, BRANCHES_PER_PAGE, page
        )
    }

    fn contents_url(&self, path: &str, reference: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_base,
            self.owner,
            self.repo,
            path.trim_start_matches('/'),
            reference
        )
    }

    fn request(&self, url: &str) -> RequestBuilder {
        let req = self
            .client
            .get(url)
            .header(USER_AGENT, concat!("versioned-docs/", env!("CARGO_PKG_VERSION")))
            .header(ACCEPT, "application/vnd.github+json");
        match &self.token {
            Some(token) => req.header(AUTHORIZATION, format!("Bearer {token}")),
            None => req,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.request(url).send().await.map_err(|e| {
            error!(error = ?e, url = %url, "Failed to reach GitHub API");
            OrchestratorError::Http {
                url: url.to_string(),
                source: e,
            }
        })?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            error!(status = %status, url = %url, "GitHub API returned error. Response body: {body}");
            return Err(OrchestratorError::Api {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        resp.json::<T>().await.map_err(|e| {
            error!(error = ?e, url = %url, "Failed to parse GitHub API response");
            OrchestratorError::Http {
                url: url.to_string(),
                source: e,
            }
        })
    }
}

#[async_trait]
impl BranchHost for GitHubClient {
    async fn list_branches(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut page = 1;
        loop {
            let url = self.branches_url(page);
            let batch: Vec<BranchEntry> = self.get_json(&url).await?;
            let size = batch.len();
            debug!(page, size, "Fetched branch page");
            names.extend(batch.into_iter().map(|b| b.name));
            if size < BRANCHES_PER_PAGE {
                break;
            }
            page += 1;
        }
        info!(count = names.len(), repo = %format!("{}/{}", self.owner, self.repo), "Listed branches");
        Ok(names)
    }

    async fn file_content(&self, path: &str, reference: &str) -> Result<FileContent> {
        let url = self.contents_url(path, reference);
        let entry: ContentEntry = self.get_json(&url).await?;
        debug!(path, reference, encoding = ?entry.encoding, "Fetched file content");
        Ok(FileContent {
            content: entry.content,
            encoding: entry.encoding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GitHubClient {
        let upstream = UpstreamRepo {
            api_base_url: "https://api.example.test/".into(),
            ..UpstreamRepo::default()
        };
        GitHubClient::new(&upstream, None)
    }

    #[test]
    fn branch_pages_are_addressed_by_number() {
        assert_eq!(
            client().branches_url(2),
            "https://api.example.test/repos/goatcorp/Dalamud/branches?per_page=100&page=2"
        );
    }

    #[test]
    fn contents_url_carries_the_ref() {
        assert_eq!(
            client().contents_url("Dalamud/Dalamud.csproj", "v9"),
            "https://api.example.test/repos/goatcorp/Dalamud/contents/Dalamud/Dalamud.csproj?ref=v9"
        );
    }

    #[test]
    fn content_entry_tolerates_missing_encoding() {
        let entry: ContentEntry = serde_json::from_str(r#"{"content":"abc"}"#).unwrap();
        assert_eq!(entry.content, "abc");
        assert!(entry.encoding.is_none());
    }
}
