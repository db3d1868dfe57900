//! `linktitle-config`: service configuration from the environment.
//!
//! Provides:
//! - Typed config schema with defaults
//! - Environment variable loading
//! - Validation with errors and warnings
//! - Redacted snapshots for safe logging

pub mod defaults;
pub mod env;
pub mod redact;
pub mod schema;
pub mod validation;

pub use redact::redact;
pub use schema::{
    CacheConfig, LoggingConfig, RateLimitConfig, RequestLimits, ResolversConfig, ServerConfig,
    ServiceConfig,
};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Result};

impl ServiceConfig {
    /// JSON snapshot with credentials masked.
    pub fn redacted(&self) -> serde_json::Value {
        match serde_json::to_value(self) {
            Ok(value) => redact(&value),
            Err(_) => serde_json::Value::Null,
        }
    }
}

/// Log every warning and error in the config's validation report and fail
/// when there are errors. Call it after the logger is installed.
pub fn check(config: &ServiceConfig) -> Result<()> {
    let report = validate(config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        bail!("{} config error(s); refusing to start", report.errors.len());
    }
    Ok(())
}
