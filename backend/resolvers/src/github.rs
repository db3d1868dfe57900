//! Repository strategy: `github.com/<owner>/<repo>` resolves through the REST API.

use linktitle_core::{names, ResolveResult};
use linktitle_security::{RedirectMode, SafeTransport};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::ResolveError;

const PLATFORM: &str = "github";
const DEFAULT_API_BASE: &str = "https://api.github.com";
const HOSTS: &[&str] = &["github.com", "www.github.com"];

/// First path segments that name site sections rather than owners.
const RESERVED_OWNERS: &[&str] = &[
    "settings",
    "notifications",
    "explore",
    "trending",
    "marketplace",
    "features",
    "topics",
    "orgs",
    "sponsors",
    "login",
    "about",
    "pricing",
];

#[derive(Debug, Deserialize)]
struct Repository {
    full_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    language: Option<String>,
}

impl Repository {
    fn summary(&self) -> String {
        let stats = match self.language.as_deref().filter(|l| !l.is_empty()) {
            Some(lang) => format!("(★ {} | {lang})", self.stargazers_count),
            None => format!("(★ {})", self.stargazers_count),
        };
        match self.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(desc) => format!("{desc} {stats}"),
            None => stats,
        }
    }
}

pub struct GitHubResolver {
    client: reqwest::Client,
    token: Option<String>,
    base_url: String,
}

impl GitHubResolver {
    pub fn new(token: Option<&str>, transport: &SafeTransport) -> Result<Self, ResolveError> {
        Ok(Self {
            client: transport.client(RedirectMode::Follow)?,
            token: token
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            base_url: DEFAULT_API_BASE.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn name(&self) -> &'static str {
        names::GITHUB
    }

    pub fn can_handle(&self, url: &Url) -> bool {
        repo_path(url).is_some()
    }

    /// A 404 from the API means "not a repository", which is not an error.
    pub async fn resolve(&self, url: &Url) -> Result<Option<ResolveResult>, ResolveError> {
        let Some((owner, repo)) = repo_path(url) else {
            return Err(ResolveError::InvalidUrl {
                url: url.to_string(),
                reason: "not a repository path".to_string(),
            });
        };

        let mut request = self
            .client
            .get(format!("{}/repos/{owner}/{repo}", self.base_url))
            .header(ACCEPT, "application/vnd.github.v3+json");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {token}"));
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => {
                debug!(owner = %owner, repo = %repo, "Repository not found");
                return Ok(None);
            }
            status => {
                return Err(ResolveError::UnexpectedStatus {
                    service: names::GITHUB,
                    status: status.as_u16(),
                })
            }
        }

        let repository: Repository = response.json().await?;
        let description = repository.summary();
        Ok(Some(
            ResolveResult::new(repository.full_name, PLATFORM).with_description(description),
        ))
    }
}

fn repo_path(url: &Url) -> Option<(String, String)> {
    let host = url.host_str()?.to_ascii_lowercase();
    if !HOSTS.contains(&host.as_str()) {
        return None;
    }
    let segments: Vec<&str> = url.path().trim_matches('/').split('/').collect();
    let [owner, repo] = segments.as_slice() else {
        return None;
    };
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    if RESERVED_OWNERS.contains(&owner.to_ascii_lowercase().as_str()) {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}
