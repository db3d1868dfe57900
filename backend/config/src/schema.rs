//! Typed service configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::defaults::*;

/// Root configuration for the link-title service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub resolvers: ResolversConfig,
    pub rate_limit: RateLimitConfig,
    pub limits: RequestLimits,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolversConfig {
    /// Video API key. Without one the video strategy runs in mock mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_token: Option<String>,

    /// Strategy names to register. Empty means all of them.
    #[serde(default)]
    pub enabled: Vec<String>,

    /// Shortener allowlist override. Empty means the built-in list.
    #[serde(default)]
    pub shortener_domains: Vec<String>,

    pub timeout_ms: u64,
}

impl Default for ResolversConfig {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            github_token: None,
            enabled: Vec::new(),
            shortener_domains: Vec::new(),
            timeout_ms: DEFAULT_RESOLVER_TIMEOUT_MS,
        }
    }
}

impl ResolversConfig {
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.is_empty() || self.enabled.iter().any(|n| n == name)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub burst: u32,
    pub sweep_interval_secs: u64,
    pub idle_expiry_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_RATE_LIMIT_RPM,
            burst: DEFAULT_RATE_LIMIT_BURST,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            idle_expiry_secs: DEFAULT_IDLE_EXPIRY_SECS,
        }
    }
}

impl RateLimitConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn idle_expiry(&self) -> Duration {
        Duration::from_secs(self.idle_expiry_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLimits {
    pub max_items: usize,
    pub max_body_bytes: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS_PER_REQUEST,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// SQLite file. Unset keeps the cache in process memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    pub level: String,
    pub debug: bool,
    /// `json` or `pretty`.
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            debug: false,
            format: DEFAULT_LOG_FORMAT.to_string(),
            dir: None,
        }
    }
}

impl LoggingConfig {
    /// `DEBUG=true` overrides the configured level.
    pub fn effective_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.level
        }
    }
}
