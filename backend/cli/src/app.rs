//! Wiring: turn a [`ServiceConfig`] into a running service.

use std::sync::Arc;

use anyhow::{Context, Result};
use linktitle_cache::{InMemoryTitleCache, SqliteTitleCache};
use linktitle_config::ServiceConfig;
use linktitle_core::{names, TitleCache};
use linktitle_gateway::{start_server, GatewayState, RateLimiter};
use linktitle_resolvers::{
    GitHubResolver, OpenGraphResolver, ResolverManager, Strategy, UnshortenerResolver,
    YouTubeResolver, DEFAULT_SHORTENER_DOMAINS,
};
use linktitle_security::SafeTransport;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub fn build_cache(config: &ServiceConfig) -> Result<Arc<dyn TitleCache>> {
    match &config.cache.db_path {
        Some(path) => {
            let cache = SqliteTitleCache::open(path)
                .with_context(|| format!("opening title cache at {}", path.display()))?;
            Ok(Arc::new(cache))
        }
        None => {
            info!("No cache database configured; titles are cached in memory");
            Ok(Arc::new(InMemoryTitleCache::new()))
        }
    }
}

fn build_strategy(name: &str, config: &ServiceConfig, transport: &SafeTransport) -> Result<Strategy> {
    let resolvers = &config.resolvers;
    let strategy: Strategy = match name {
        names::YOUTUBE => {
            let youtube = YouTubeResolver::new(resolvers.youtube_api_key.as_deref(), transport)?;
            if youtube.is_mock() {
                warn!("Video resolver running in mock mode");
            }
            youtube.into()
        }
        names::GITHUB => {
            let github = GitHubResolver::new(resolvers.github_token.as_deref(), transport)?;
            if !github.has_token() {
                info!("Code host resolver is unauthenticated; API rate limits are low");
            }
            github.into()
        }
        names::UNSHORTENER if resolvers.shortener_domains.is_empty() => {
            UnshortenerResolver::new(transport, DEFAULT_SHORTENER_DOMAINS.iter().copied())?.into()
        }
        names::UNSHORTENER => {
            UnshortenerResolver::new(transport, resolvers.shortener_domains.iter())?.into()
        }
        names::OPENGRAPH => OpenGraphResolver::new(transport)?.into(),
        other => anyhow::bail!("unknown resolver '{other}'"),
    };
    Ok(strategy)
}

/// Register every enabled strategy in priority order.
pub fn build_manager(
    config: &ServiceConfig,
    cache: Arc<dyn TitleCache>,
    transport: &SafeTransport,
) -> Result<ResolverManager> {
    let mut manager = ResolverManager::new(cache).with_timeout(config.resolvers.timeout());
    for name in names::ALL {
        if config.resolvers.is_enabled(name) {
            manager.register(build_strategy(name, config, transport)?)?;
        }
    }
    Ok(manager)
}

pub async fn run_server(config: ServiceConfig) -> Result<()> {
    info!(config = %config.redacted(), "Starting linktitle");

    let transport = SafeTransport::new();
    let cache = build_cache(&config)?;
    let manager = Arc::new(build_manager(&config, cache, &transport)?);

    let rl = &config.rate_limit;
    let limiter = RateLimiter::new(rl.requests_per_minute, rl.burst, rl.idle_expiry());
    let sweeper = limiter.spawn_sweeper(rl.sweep_interval());

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
        }
        signal.cancel();
    });

    let state = GatewayState::new(manager, config.limits.clone());
    let served = start_server(&config.server.addr(), state, limiter.clone(), shutdown).await;

    limiter.shutdown();
    if let Err(e) = sweeper.await {
        warn!(error = %e, "Rate limit sweeper did not stop cleanly");
    }
    served
}
