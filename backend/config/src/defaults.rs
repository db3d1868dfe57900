//! Default values for every setting that has one.

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Per-batch resolution deadline.
pub const DEFAULT_RESOLVER_TIMEOUT_MS: u64 = 2000;
pub const MAX_RESOLVER_TIMEOUT_MS: u64 = 300_000;

pub const DEFAULT_RATE_LIMIT_RPM: u32 = 60;
pub const DEFAULT_RATE_LIMIT_BURST: u32 = 20;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 86_400;

/// Visitors idle longer than this are forgotten by the sweeper.
pub const DEFAULT_IDLE_EXPIRY_SECS: u64 = 180;

pub const DEFAULT_MAX_ITEMS_PER_REQUEST: usize = 50;
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FORMAT: &str = "json";
