//! Generic page scraper used as the fallback for any http(s) URL.

use linktitle_core::{names, ResolveResult};
use linktitle_security::{RedirectMode, SafeTransport};
use reqwest::StatusCode;
use tracing::debug;
use url::Url;

use crate::error::ResolveError;
use crate::extract::{extract_metadata, MAX_BODY_BYTES};

const PLATFORM: &str = "generic";

pub struct OpenGraphResolver {
    client: reqwest::Client,
    transport: SafeTransport,
}

impl OpenGraphResolver {
    pub fn new(transport: &SafeTransport) -> Result<Self, ResolveError> {
        Ok(Self {
            client: transport.client(RedirectMode::Follow)?,
            transport: transport.clone(),
        })
    }

    pub fn name(&self) -> &'static str {
        names::OPENGRAPH
    }

    pub fn can_handle(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
    }

    pub async fn resolve(&self, url: &Url) -> Result<Option<ResolveResult>, ResolveError> {
        self.transport.check_url(url)?;

        let response = self.client.get(url.clone()).send().await?;
        if response.status() != StatusCode::OK {
            return Err(ResolveError::UnexpectedStatus {
                service: names::OPENGRAPH,
                status: response.status().as_u16(),
            });
        }

        let body = read_bounded(response, MAX_BODY_BYTES).await?;
        let meta = extract_metadata(&body)?;
        debug!(url = %url, bytes = body.len(), "Scraped page metadata");

        Ok(Some(
            ResolveResult::new(meta.title, PLATFORM).with_description(meta.description),
        ))
    }
}

/// Read at most `limit` bytes of the body; the rest is never downloaded.
async fn read_bounded(mut response: reqwest::Response, limit: usize) -> Result<String, ResolveError> {
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = limit - buf.len();
        if chunk.len() >= room {
            buf.extend_from_slice(&chunk[..room]);
            break;
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, response::Html, routing::get, Router};

    async fn spawn_site() -> String {
        let big = format!(
            "<html><head></head><body>{}<title>Too Late</title></body></html>",
            "x".repeat(MAX_BODY_BYTES)
        );
        let app = Router::new()
            .route(
                "/article",
                get(|| async {
                    Html(
                        r#"<html><head>
                        <meta property="og:title" content="Article &amp; Co">
                        <meta property="og:description" content="Summary here">
                        <title>Fallback</title></head></html>"#,
                    )
                }),
            )
            .route(
                "/plain",
                get(|| async { Html("<html><title>\n  Plain Page </title></html>") }),
            )
            .route("/empty", get(|| async { Html("<html><body>nothing</body></html>") }))
            .route("/gone", get(|| async { AxumStatus::GONE }))
            .route("/big", get(move || async move { Html(big) }))
            .route(
                "/moved",
                get(|| async { axum::response::Redirect::temporary("/plain") }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn local_resolver() -> OpenGraphResolver {
        OpenGraphResolver::new(&SafeTransport::new().allow_private_networks(true)).unwrap()
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn handles_http_schemes_only() {
        let r = OpenGraphResolver::new(&SafeTransport::new()).unwrap();
        assert!(r.can_handle(&url("https://example.com/")));
        assert!(r.can_handle(&url("http://example.com/")));
        assert!(!r.can_handle(&url("ftp://example.com/file")));
        assert!(!r.can_handle(&url("mailto:someone@example.com")));
    }

    #[tokio::test]
    async fn scrapes_open_graph_and_title_fallback() {
        let base = spawn_site().await;
        let r = local_resolver();

        let res = r.resolve(&url(&format!("{base}/article"))).await.unwrap().unwrap();
        assert_eq!(res.title, "Article & Co");
        assert_eq!(res.description, "Summary here");
        assert_eq!(res.platform, "generic");

        let res = r.resolve(&url(&format!("{base}/plain"))).await.unwrap().unwrap();
        assert_eq!(res.title, "Plain Page");

        let res = r.resolve(&url(&format!("{base}/moved"))).await.unwrap().unwrap();
        assert_eq!(res.title, "Plain Page");
    }

    #[tokio::test]
    async fn failures_are_errors() {
        let base = spawn_site().await;
        let r = local_resolver();

        let err = r.resolve(&url(&format!("{base}/gone"))).await.unwrap_err();
        assert!(matches!(err, ResolveError::UnexpectedStatus { status: 410, .. }));

        let err = r.resolve(&url(&format!("{base}/empty"))).await.unwrap_err();
        assert!(matches!(err, ResolveError::NoTitle));

        // The title sits past the read limit.
        let err = r.resolve(&url(&format!("{base}/big"))).await.unwrap_err();
        assert!(matches!(err, ResolveError::NoTitle));
    }

    #[tokio::test]
    async fn private_destinations_are_refused_by_default() {
        let base = spawn_site().await;
        let r = OpenGraphResolver::new(&SafeTransport::new()).unwrap();
        let err = r.resolve(&url(&format!("{base}/plain"))).await.unwrap_err();
        assert!(matches!(err, ResolveError::Transport(_)));
    }
}
