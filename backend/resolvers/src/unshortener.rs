//! Expands known link-shortener URLs and hands the destination back to the
//! manager, excluding itself, so the most specific strategy gets the final URL.

use std::collections::HashSet;

use linktitle_core::{names, ResolveResult};
use linktitle_security::{RedirectMode, SafeTransport};
use reqwest::header::LOCATION;
use tracing::debug;
use url::Url;

use crate::error::ResolveError;
use crate::manager::ResolverManager;

/// Redirects followed before giving up.
pub const MAX_HOPS: usize = 5;

pub const DEFAULT_SHORTENER_DOMAINS: &[&str] = &[
    "bit.ly",
    "t.co",
    "tinyurl.com",
    "is.gd",
    "buff.ly",
    "goo.gl",
    "bit.do",
    "ow.ly",
    "t.ly",
    "shorturl.at",
];

pub struct UnshortenerResolver {
    client: reqwest::Client,
    transport: SafeTransport,
    domains: HashSet<String>,
}

impl UnshortenerResolver {
    pub fn new<I, S>(transport: &SafeTransport, domains: I) -> Result<Self, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            client: transport.client(RedirectMode::Manual)?,
            transport: transport.clone(),
            domains: domains
                .into_iter()
                .map(|d| normalize_host(d.as_ref()))
                .filter(|d| !d.is_empty())
                .collect(),
        })
    }

    pub fn with_default_domains(transport: &SafeTransport) -> Result<Self, ResolveError> {
        Self::new(transport, DEFAULT_SHORTENER_DOMAINS.iter().copied())
    }

    pub fn name(&self) -> &'static str {
        names::UNSHORTENER
    }

    pub fn can_handle(&self, url: &Url) -> bool {
        url.host_str()
            .map(|h| self.domains.contains(&normalize_host(h)))
            .unwrap_or(false)
    }

    pub async fn resolve(
        &self,
        url: &Url,
        manager: &ResolverManager,
    ) -> Result<Option<ResolveResult>, ResolveError> {
        let destination = self.expand(url).await?;
        debug!(from = %url, to = %destination, "Expanded short link");
        manager
            .resolve_skipping(&destination, self.name())
            .await
            .map(Some)
    }

    /// Follow redirects one HEAD request at a time until a non-redirect
    /// response. Visiting a URL twice is a loop; [`MAX_HOPS`] redirects
    /// without reaching a final page is an error.
    pub async fn expand(&self, url: &Url) -> Result<Url, ResolveError> {
        let mut current = url.clone();
        let mut seen: HashSet<String> = HashSet::new();
        let mut hops = 0;

        loop {
            if !seen.insert(current.as_str().to_string()) {
                return Err(ResolveError::RedirectLoop(current.to_string()));
            }
            self.transport.check_url(&current)?;

            let response = self.client.head(current.clone()).send().await?;
            if !response.status().is_redirection() {
                return Ok(current);
            }
            let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
            else {
                return Ok(current);
            };
            let next = match current.join(location) {
                Ok(next) => next,
                Err(e) => {
                    debug!(url = %current, location, error = %e, "Unparseable redirect target");
                    return Ok(current);
                }
            };

            hops += 1;
            if hops >= MAX_HOPS {
                return Err(ResolveError::HopLimitExceeded {
                    url: url.to_string(),
                    limit: MAX_HOPS,
                });
            }
            current = next;
        }
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    let host = host.split(':').next().unwrap_or_default();
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::{header, StatusCode},
        response::{Html, IntoResponse},
        routing::get,
        Router,
    };

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn redirect(to: String) -> axum::response::Response {
        (StatusCode::FOUND, [(header::LOCATION, to)]).into_response()
    }

    /// `/chain/n` redirects to `/chain/n-1`; `/chain/0` is the landing page.
    async fn spawn_redirector() -> String {
        let app = Router::new()
            .route(
                "/chain/:n",
                get(|Path(n): Path<usize>| async move {
                    if n == 0 {
                        Html("<title>Landing</title>").into_response()
                    } else {
                        redirect(format!("/chain/{}", n - 1))
                    }
                }),
            )
            .route("/loop/a", get(|| async { redirect("/loop/b".into()) }))
            .route("/loop/b", get(|| async { redirect("/loop/a".into()) }))
            .route("/self", get(|| async { redirect("/self".into()) }))
            .route(
                "/bare",
                get(|| async { StatusCode::MOVED_PERMANENTLY.into_response() }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn local_resolver() -> UnshortenerResolver {
        let transport = SafeTransport::new().allow_private_networks(true);
        UnshortenerResolver::new(&transport, ["127.0.0.1"]).unwrap()
    }

    #[test]
    fn domain_matching_ignores_case_www_and_port() {
        let r = UnshortenerResolver::with_default_domains(&SafeTransport::new()).unwrap();
        assert!(r.can_handle(&url("https://bit.ly/abc")));
        assert!(r.can_handle(&url("https://WWW.Bit.Ly/abc")));
        assert!(r.can_handle(&url("http://t.co:8080/x")));
        assert!(!r.can_handle(&url("https://notbit.ly/abc")));
        assert!(!r.can_handle(&url("https://example.com/abc")));

        let custom = UnshortenerResolver::new(&SafeTransport::new(), ["WWW.Short.Example"]).unwrap();
        assert!(custom.can_handle(&url("https://short.example/x")));
    }

    #[tokio::test]
    async fn four_hops_reach_the_landing_page() {
        let base = spawn_redirector().await;
        let final_url = local_resolver()
            .expand(&url(&format!("{base}/chain/4")))
            .await
            .unwrap();
        assert_eq!(final_url.path(), "/chain/0");
    }

    #[tokio::test]
    async fn five_hops_exceed_the_limit() {
        let base = spawn_redirector().await;
        let err = local_resolver()
            .expand(&url(&format!("{base}/chain/5")))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::HopLimitExceeded { limit: MAX_HOPS, .. }));
        assert!(err.is_terminal());
    }

    #[tokio::test]
    async fn revisiting_a_url_is_a_loop() {
        let base = spawn_redirector().await;
        let r = local_resolver();

        let err = r.expand(&url(&format!("{base}/loop/a"))).await.unwrap_err();
        assert!(matches!(err, ResolveError::RedirectLoop(ref at) if at.ends_with("/loop/a")));

        let err = r.expand(&url(&format!("{base}/self"))).await.unwrap_err();
        assert!(matches!(err, ResolveError::RedirectLoop(_)));
    }

    #[tokio::test]
    async fn redirect_without_location_stops_in_place() {
        let base = spawn_redirector().await;
        let final_url = local_resolver()
            .expand(&url(&format!("{base}/bare")))
            .await
            .unwrap();
        assert_eq!(final_url.path(), "/bare");
    }

    #[tokio::test]
    async fn private_targets_are_refused_by_default() {
        let base = spawn_redirector().await;
        let r = UnshortenerResolver::new(&SafeTransport::new(), ["127.0.0.1"]).unwrap();
        let err = r.expand(&url(&format!("{base}/chain/1"))).await.unwrap_err();
        assert!(matches!(err, ResolveError::Transport(_)));
    }
}
