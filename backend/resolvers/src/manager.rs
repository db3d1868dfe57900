//! Cache-aside batch resolution over an ordered list of strategies.
//!
//! A batch first consults the cache in one round trip, then resolves every
//! distinct miss concurrently under a single shared deadline. Whatever has
//! finished by the deadline is returned; stragglers are dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_recursion::async_recursion;
use linktitle_core::{canonical_video_url, ResolveResult, TitleCache};
use logging::redact_sensitive_data;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ResolveError;
use crate::strategy::Strategy;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Longest batch deadline accepted; larger values are clamped.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(300);

/// Platform tag reported for results served from the cache.
pub const CACHE_PLATFORM: &str = "cache";

pub struct ResolverManager {
    strategies: Vec<Strategy>,
    cache: Arc<dyn TitleCache>,
    timeout: Duration,
}

impl ResolverManager {
    pub fn new(cache: Arc<dyn TitleCache>) -> Self {
        Self {
            strategies: Vec::new(),
            cache,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.min(MAX_TIMEOUT);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Append a strategy. Registration order is dispatch priority.
    pub fn register(&mut self, strategy: impl Into<Strategy>) -> Result<(), ResolveError> {
        let strategy = strategy.into();
        if self.strategies.iter().any(|s| s.name() == strategy.name()) {
            return Err(ResolveError::DuplicateResolver(strategy.name().to_string()));
        }
        info!(resolver = strategy.name(), "Registered resolver");
        self.strategies.push(strategy);
        Ok(())
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(Strategy::name).collect()
    }

    /// Resolve a batch of URLs. The returned map is keyed by the strings as
    /// submitted; keys that could not be resolved in time, or at all, are
    /// simply absent.
    pub async fn resolve_multi(self: &Arc<Self>, urls: &[String]) -> HashMap<String, ResolveResult> {
        // Trimmed lookup key -> every submitted spelling of it.
        let mut submitted: HashMap<&str, Vec<&String>> = HashMap::new();
        let mut unique: Vec<String> = Vec::with_capacity(urls.len());
        for url in urls {
            let key = url.trim();
            if key.is_empty() {
                continue;
            }
            let spellings = submitted.entry(key).or_default();
            if spellings.is_empty() {
                unique.push(key.to_string());
            }
            if !spellings.contains(&url) {
                spellings.push(url);
            }
        }
        if unique.is_empty() {
            return HashMap::new();
        }

        let mut out = HashMap::with_capacity(urls.len());
        for (key, result) in self.resolve_keys(unique).await {
            for spelling in submitted.get(key.as_str()).into_iter().flatten() {
                out.insert((*spelling).clone(), result.clone());
            }
        }
        out
    }

    async fn resolve_keys(self: &Arc<Self>, unique: Vec<String>) -> HashMap<String, ResolveResult> {
        let cached = self.cache.get_multi(&unique).await;
        let mut resolved: HashMap<String, ResolveResult> = cached
            .into_iter()
            .filter(|(_, title)| !title.trim().is_empty())
            .map(|(url, title)| (url, ResolveResult::new(title, CACHE_PLATFORM)))
            .collect();

        let misses: Vec<String> = unique
            .into_iter()
            .filter(|url| !resolved.contains_key(url))
            .collect();
        if misses.is_empty() {
            return resolved;
        }

        debug!(
            hits = resolved.len(),
            misses = misses.len(),
            "Resolving cache misses"
        );

        let now = Instant::now();
        let deadline = now.checked_add(self.timeout).unwrap_or(now + MAX_TIMEOUT);
        let fresh: Arc<Mutex<HashMap<String, ResolveResult>>> = Arc::new(Mutex::new(HashMap::new()));
        let mut tasks = JoinSet::new();

        for url in misses {
            let manager = Arc::clone(self);
            let fresh = Arc::clone(&fresh);
            tasks.spawn(async move {
                match tokio::time::timeout_at(deadline, manager.resolve_one(&url)).await {
                    Ok(Some(result)) => {
                        let mut guard = fresh.lock().await;
                        manager.cache.set(&url, &result.title).await;
                        guard.insert(url, result);
                    }
                    Ok(None) => debug!(url = %redact_sensitive_data(&url), "No resolver produced a title"),
                    Err(_) => debug!(url = %redact_sensitive_data(&url), "Resolution deadline exceeded"),
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Resolution task failed");
            }
        }

        let fresh = std::mem::take(&mut *fresh.lock().await);
        resolved.extend(fresh);
        resolved
    }

    /// Resolve bare video identifiers. The returned map is keyed by the
    /// identifiers as given and holds titles only.
    pub async fn resolve_legacy_ids(self: &Arc<Self>, ids: &[String]) -> HashMap<String, String> {
        let mut by_url: HashMap<String, Vec<&String>> = HashMap::new();
        for id in ids.iter().filter(|id| !id.trim().is_empty()) {
            let spellings = by_url.entry(canonical_video_url(id)).or_default();
            if !spellings.contains(&id) {
                spellings.push(id);
            }
        }
        if by_url.is_empty() {
            return HashMap::new();
        }

        let urls: Vec<String> = by_url.keys().cloned().collect();
        let mut out = HashMap::with_capacity(ids.len());
        for (url, result) in self.resolve_multi(&urls).await {
            for id in by_url.get(&url).into_iter().flatten() {
                out.insert((*id).clone(), result.title.clone());
            }
        }
        out
    }

    /// Run the dispatch loop for one URL with the named strategy left out.
    /// The cache is not consulted.
    #[async_recursion]
    pub async fn resolve_skipping(
        &self,
        url: &Url,
        exclude: &str,
    ) -> Result<ResolveResult, ResolveError> {
        for strategy in self.strategies.iter().filter(|s| s.name() != exclude) {
            if !strategy.can_handle(url) {
                continue;
            }
            match strategy.resolve(url, self).await {
                Ok(Some(result)) if result.is_usable() => return Ok(result),
                Ok(_) => debug!(resolver = strategy.name(), "Resolver returned nothing"),
                Err(e) => debug!(
                    resolver = strategy.name(),
                    error = %redact_sensitive_data(&e.to_string()),
                    "Resolver failed"
                ),
            }
        }
        Err(ResolveError::NoResolver(url.to_string()))
    }

    async fn resolve_one(&self, raw: &str) -> Option<ResolveResult> {
        let url = match Url::parse(raw.trim()) {
            Ok(url) => url,
            Err(e) => {
                debug!(url = %redact_sensitive_data(raw), error = %e, "Skipping unparseable URL");
                return None;
            }
        };

        for strategy in &self.strategies {
            if !strategy.can_handle(&url) {
                continue;
            }
            match strategy.resolve(&url, self).await {
                Ok(Some(result)) if result.is_usable() => return Some(result),
                Ok(_) => debug!(resolver = strategy.name(), "Resolver returned nothing"),
                Err(e) if e.is_terminal() => {
                    warn!(
                        resolver = strategy.name(),
                        error = %redact_sensitive_data(&e.to_string()),
                        "Giving up on URL"
                    );
                    return None;
                }
                Err(e) => debug!(
                    resolver = strategy.name(),
                    error = %redact_sensitive_data(&e.to_string()),
                    "Resolver failed, trying next"
                ),
            }
        }
        None
    }
}
