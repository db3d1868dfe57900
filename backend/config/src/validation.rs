//! Config validation: errors abort start-up, warnings are only logged.

use crate::defaults::{MAX_RESOLVER_TIMEOUT_MS, MAX_SWEEP_INTERVAL_SECS};
use crate::schema::ServiceConfig;
use linktitle_core::names;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &ServiceConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_resolvers(config, &mut report);
    validate_rate_limit(config, &mut report);
    validate_limits(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_resolvers(config: &ServiceConfig, report: &mut ValidationReport) {
    let resolvers = &config.resolvers;
    if resolvers.timeout_ms == 0 {
        report.error("resolvers.timeoutMs", "Resolver timeout must be > 0");
    } else if resolvers.timeout_ms > MAX_RESOLVER_TIMEOUT_MS {
        report.error(
            "resolvers.timeoutMs",
            format!("Resolver timeout must be <= {MAX_RESOLVER_TIMEOUT_MS}"),
        );
    }

    for name in &resolvers.enabled {
        if !names::is_known(name) {
            report.error(
                "resolvers.enabled",
                format!(
                    "Unknown resolver '{name}'. Use one of: {}",
                    names::ALL.join(", ")
                ),
            );
        }
    }

    if resolvers.is_enabled(names::YOUTUBE) && resolvers.youtube_api_key.is_none() {
        report.warn(
            "resolvers.youtubeApiKey",
            "No video API key; video titles will be mocked",
        );
    }
    if resolvers.is_enabled(names::GITHUB) && resolvers.github_token.is_none() {
        report.warn(
            "resolvers.githubToken",
            "No repository API token; requests are subject to anonymous rate limits",
        );
    }
    if !resolvers.is_enabled(names::OPENGRAPH) {
        report.warn(
            "resolvers.enabled",
            "Generic page scraper is disabled; most URLs will go unresolved",
        );
    }
}

fn validate_rate_limit(config: &ServiceConfig, report: &mut ValidationReport) {
    let rl = &config.rate_limit;
    if rl.requests_per_minute == 0 {
        report.error("rateLimit.requestsPerMinute", "requestsPerMinute must be >= 1");
    }
    if rl.burst == 0 {
        report.error("rateLimit.burst", "burst must be >= 1");
    }
    if rl.sweep_interval_secs == 0 {
        report.error("rateLimit.sweepIntervalSecs", "sweepIntervalSecs must be >= 1");
    } else if rl.sweep_interval_secs > MAX_SWEEP_INTERVAL_SECS {
        report.error(
            "rateLimit.sweepIntervalSecs",
            format!("sweepIntervalSecs must be <= {MAX_SWEEP_INTERVAL_SECS}"),
        );
    }
    if rl.idle_expiry_secs == 0 {
        report.error("rateLimit.idleExpirySecs", "idleExpirySecs must be >= 1");
    }
}

fn validate_limits(config: &ServiceConfig, report: &mut ValidationReport) {
    if config.limits.max_items == 0 {
        report.error("limits.maxItems", "maxItems must be >= 1");
    }
    if config.limits.max_body_bytes == 0 {
        report.error("limits.maxBodyBytes", "maxBodyBytes must be >= 1");
    }
    if config.server.port < 1024 && config.server.port != 80 && config.server.port != 443 {
        report.warn(
            "server.port",
            format!(
                "Port {} requires elevated privileges; consider using a port >= 1024",
                config.server.port
            ),
        );
    }
}

fn validate_logging(config: &ServiceConfig, report: &mut ValidationReport) {
    if !matches!(config.logging.format.as_str(), "json" | "pretty" | "text") {
        report.warn(
            "logging.format",
            format!(
                "Unknown log format '{}'; falling back to json",
                config.logging.format
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> ServiceConfig {
        let mut cfg = ServiceConfig::default();
        cfg.resolvers.youtube_api_key = Some("key".into());
        cfg.resolvers.github_token = Some("token".into());
        cfg
    }

    #[test]
    fn fully_configured_defaults_are_clean() {
        let report = validate(&configured());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
    }

    #[test]
    fn missing_credentials_only_warn() {
        let report = validate(&ServiceConfig::default());
        assert!(report.is_valid());
        let paths: Vec<&str> = report.warnings.iter().map(|w| w.path.as_str()).collect();
        assert!(paths.contains(&"resolvers.youtubeApiKey"));
        assert!(paths.contains(&"resolvers.githubToken"));
    }

    #[test]
    fn zero_limits_are_errors() {
        let mut cfg = configured();
        cfg.rate_limit.requests_per_minute = 0;
        cfg.rate_limit.burst = 0;
        cfg.resolvers.timeout_ms = 0;
        cfg.limits.max_items = 0;
        let report = validate(&cfg);
        assert_eq!(report.errors.len(), 4);
    }

    #[test]
    fn oversized_durations_are_errors() {
        let mut cfg = configured();
        cfg.resolvers.timeout_ms = u64::MAX;
        cfg.rate_limit.sweep_interval_secs = u64::MAX;
        let report = validate(&cfg);
        let paths: Vec<_> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["resolvers.timeoutMs", "rateLimit.sweepIntervalSecs"]);
    }

    #[test]
    fn unknown_resolver_is_error() {
        let mut cfg = configured();
        cfg.resolvers.enabled = vec!["youtube".into(), "vimeo".into()];
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert!(report.errors[0].message.contains("vimeo"));
        assert!(report
            .warnings
            .iter()
            .any(|w| w.message.contains("scraper is disabled")));
    }
}
