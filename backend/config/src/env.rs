//! Build a [`ServiceConfig`] from process environment variables.
//!
//! Every variable is optional. Values that fail to parse keep the default and
//! log a warning instead of aborting start-up.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::schema::ServiceConfig;

pub const BIND: &str = "LINKTITLE_BIND";
pub const PORT: &str = "PORT";
pub const YOUTUBE_API_KEY: &str = "YOUTUBE_API_KEY";
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const ENABLED_RESOLVERS: &str = "ENABLED_RESOLVERS";
pub const SHORTENER_DOMAINS: &str = "SHORTENER_DOMAINS";
pub const RESOLVER_TIMEOUT_MS: &str = "RESOLVER_TIMEOUT_MS";
pub const RATE_LIMIT_RPM: &str = "RATE_LIMIT_RPM";
pub const RATE_LIMIT_BURST: &str = "RATE_LIMIT_BURST";
pub const RATE_LIMIT_SWEEP_SECS: &str = "RATE_LIMIT_SWEEP_SECS";
pub const RATE_LIMIT_EXPIRY_SECS: &str = "RATE_LIMIT_EXPIRY_SECS";
pub const MAX_ITEMS_PER_REQUEST: &str = "MAX_ITEMS_PER_REQUEST";
pub const MAX_BODY_BYTES: &str = "MAX_BODY_BYTES";
pub const CACHE_DB_PATH: &str = "CACHE_DB_PATH";
pub const RUST_LOG: &str = "RUST_LOG";
pub const DEBUG: &str = "DEBUG";
pub const LOG_FORMAT: &str = "LOG_FORMAT";
pub const LOG_DIR: &str = "LOG_DIR";

impl ServiceConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(&std::env::vars().collect())
    }

    /// Read configuration from a provided map (useful for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Self {
        let env = Vars(vars);
        let mut config = ServiceConfig::default();

        if let Some(bind) = env.string(BIND) {
            config.server.bind = bind;
        }
        env.parse_into(PORT, &mut config.server.port);

        config.resolvers.youtube_api_key = env.string(YOUTUBE_API_KEY);
        config.resolvers.github_token = env.string(GITHUB_TOKEN);
        config.resolvers.enabled = env.list(ENABLED_RESOLVERS);
        config.resolvers.shortener_domains = env.list(SHORTENER_DOMAINS);
        env.parse_into(RESOLVER_TIMEOUT_MS, &mut config.resolvers.timeout_ms);

        env.parse_into(RATE_LIMIT_RPM, &mut config.rate_limit.requests_per_minute);
        env.parse_into(RATE_LIMIT_BURST, &mut config.rate_limit.burst);
        env.parse_into(RATE_LIMIT_SWEEP_SECS, &mut config.rate_limit.sweep_interval_secs);
        env.parse_into(RATE_LIMIT_EXPIRY_SECS, &mut config.rate_limit.idle_expiry_secs);

        env.parse_into(MAX_ITEMS_PER_REQUEST, &mut config.limits.max_items);
        env.parse_into(MAX_BODY_BYTES, &mut config.limits.max_body_bytes);

        config.cache.db_path = env.string(CACHE_DB_PATH).map(PathBuf::from);

        if let Some(level) = env.string(RUST_LOG) {
            config.logging.level = level;
        }
        config.logging.debug = env.flag(DEBUG);
        if let Some(format) = env.string(LOG_FORMAT) {
            config.logging.format = format.to_ascii_lowercase();
        }
        config.logging.dir = env.string(LOG_DIR).map(PathBuf::from);

        config
    }
}

struct Vars<'a>(&'a HashMap<String, String>);

impl Vars<'_> {
    /// Trimmed, non-empty value.
    fn string(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.string(key)
            .map(|raw| {
                raw.split(',')
                    .map(|item| item.trim().to_ascii_lowercase())
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn flag(&self, key: &str) -> bool {
        self.string(key)
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false)
    }

    fn parse_into<T>(&self, key: &str, slot: &mut T)
    where
        T: FromStr + std::fmt::Display,
    {
        let Some(raw) = self.string(key) else { return };
        match raw.parse::<T>() {
            Ok(value) => *slot = value,
            Err(_) => warn!(var = key, value = %raw, default = %slot, "Ignoring unparseable value"),
        }
    }
}
