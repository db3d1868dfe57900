//! Video-host strategy backed by the YouTube Data API.
//!
//! Without an API key the resolver runs in mock mode and derives a synthetic
//! title from the video id, so the whole pipeline works offline.

use linktitle_core::{names, ResolveResult};
use linktitle_security::{RedirectMode, SafeTransport};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::ResolveError;

const PLATFORM: &str = "youtube";
const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com", "youtu.be"];
const ID_PATH_PREFIXES: &[&str] = &["/shorts/", "/live/", "/embed/"];

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    snippet: VideoSnippet,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    title: String,
}

struct VideoApi {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

pub struct YouTubeResolver {
    api: Option<VideoApi>,
}

impl YouTubeResolver {
    /// Resolver that never calls out and returns synthetic titles.
    pub fn mock() -> Self {
        Self { api: None }
    }

    /// Real API resolver; a missing or blank key falls back to mock mode.
    pub fn new(api_key: Option<&str>, transport: &SafeTransport) -> Result<Self, ResolveError> {
        let Some(key) = api_key.map(str::trim).filter(|k| !k.is_empty()) else {
            return Ok(Self::mock());
        };
        Ok(Self {
            api: Some(VideoApi {
                client: transport.client(RedirectMode::Follow)?,
                api_key: key.to_string(),
                base_url: DEFAULT_API_BASE.to_string(),
            }),
        })
    }

    /// Point the API client somewhere else (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        if let Some(api) = self.api.as_mut() {
            api.base_url = base_url.into().trim_end_matches('/').to_string();
        }
        self
    }

    pub fn is_mock(&self) -> bool {
        self.api.is_none()
    }

    pub fn name(&self) -> &'static str {
        names::YOUTUBE
    }

    pub fn can_handle(&self, url: &Url) -> bool {
        url.host_str()
            .map(|h| HOSTS.contains(&h.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }

    pub async fn resolve(&self, url: &Url) -> Result<Option<ResolveResult>, ResolveError> {
        let video_id =
            extract_video_id(url).ok_or_else(|| ResolveError::MissingVideoId(url.to_string()))?;

        let Some(api) = &self.api else {
            return Ok(Some(ResolveResult::new(
                format!("Mock Title for Video {video_id}"),
                PLATFORM,
            )));
        };

        debug!(video_id = %video_id, "Querying video API");
        let response = api
            .client
            .get(format!("{}/videos", api.base_url))
            .query(&[
                ("part", "snippet"),
                ("id", video_id.as_str()),
                ("key", api.api_key.as_str()),
            ])
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(ResolveError::UnexpectedStatus {
                service: names::YOUTUBE,
                status: response.status().as_u16(),
            });
        }

        let list: VideoListResponse = response.json().await?;
        let item = list
            .items
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NotFound(format!("video {video_id}")))?;

        Ok(Some(ResolveResult::new(item.snippet.title, PLATFORM)))
    }
}

/// Pull the video id out of watch, short-link, shorts, live and embed URLs.
pub fn extract_video_id(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let candidate = if host == "youtu.be" {
        url.path_segments()?.next().map(str::to_string)
    } else if let Some((_, v)) = url.query_pairs().find(|(k, _)| k == "v") {
        Some(v.into_owned())
    } else {
        ID_PATH_PREFIXES.iter().find_map(|prefix| {
            url.path()
                .strip_prefix(prefix)
                .and_then(|rest| rest.split('/').next())
                .map(str::to_string)
        })
    };
    candidate.map(|id| id.trim().to_string()).filter(|id| !id.is_empty())
}
