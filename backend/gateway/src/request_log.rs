//! Structured access log for every HTTP request.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

const FORWARDED_FOR: &str = "x-forwarded-for";
const CLOUD_TRACE: &str = "x-cloud-trace-context";
const REQUEST_ID: &str = "x-request-id";

/// Client key for rate limiting and logs: first `X-Forwarded-For` entry, then
/// the socket peer, then `"unknown"`.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("")
}

pub async fn log_requests(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let request_id = Uuid::new_v4();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let span = info_span!(
        "http_request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
        ip = %client_ip(request.headers(), peer),
        user_agent = %header_str(request.headers(), "user-agent"),
        trace = %header_str(request.headers(), CLOUD_TRACE),
    );

    let mut response = next.run(request).instrument(span.clone()).await;

    span.in_scope(|| {
        info!(
            status = response.status().as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "Request completed"
        )
    });

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn forwarded_for_wins_over_peer() {
        let peer: SocketAddr = "10.0.0.9:5555".parse().unwrap();
        let h = headers(&[(FORWARDED_FOR, " 203.0.113.7 , 10.0.0.1")]);
        assert_eq!(client_ip(&h, Some(peer)), "203.0.113.7");
    }

    #[test]
    fn falls_back_to_peer_then_unknown() {
        let peer: SocketAddr = "198.51.100.4:443".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)), "198.51.100.4");
        assert_eq!(client_ip(&headers(&[(FORWARDED_FOR, "")]), None), "unknown");
        assert_eq!(client_ip(&HeaderMap::new(), None), "unknown");
    }
}
