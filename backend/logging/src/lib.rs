//! Structured logging for linktitle.
//!
//! Handles subscriber set-up (JSON or pretty console, optional rolling NDJSON
//! file) and scrubbing of credentials that ride along in URLs and headers.

pub mod logger;
pub mod redact;

pub use logger::{init_logger, LogFormat, LoggerOptions};
pub use redact::redact_sensitive_data;
