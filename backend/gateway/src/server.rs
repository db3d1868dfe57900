//! HTTP server: routing, middleware stack and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, Method},
    middleware,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use linktitle_config::RequestLimits;
use linktitle_resolvers::ResolverManager;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, instrument};

use crate::health_api;
use crate::rate_limit::{self, RateLimiter};
use crate::request_log;
use crate::resolve_api;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub manager: Arc<ResolverManager>,
    pub limits: RequestLimits,
    pub started_at: DateTime<Utc>,
}

impl GatewayState {
    pub fn new(manager: Arc<ResolverManager>, limits: RequestLimits) -> Self {
        Self {
            manager,
            limits,
            started_at: Utc::now(),
        }
    }
}

/// Build the router. Only `/resolve` is rate limited.
pub fn build_router(state: GatewayState, limiter: RateLimiter) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    let limited = Router::new()
        .route("/resolve", post(resolve_api::resolve))
        .route_layer(middleware::from_fn_with_state(limiter, rate_limit::enforce));

    Router::new()
        .route("/health", get(health_api::health))
        .route("/api/health", get(health_api::get_health))
        .merge(limited)
        .layer(DefaultBodyLimit::max(state.limits.max_body_bytes))
        .layer(middleware::from_fn(request_log::log_requests))
        .layer(cors)
        .with_state(state)
}

/// Serve until `shutdown` is cancelled, then drain in-flight requests.
#[instrument(skip(state, limiter, shutdown))]
pub async fn start_server(
    addr: &str,
    state: GatewayState,
    limiter: RateLimiter,
    shutdown: CancellationToken,
) -> Result<()> {
    let app = build_router(state, limiter);
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP API listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await?;

    info!("HTTP API stopped");
    Ok(())
}
