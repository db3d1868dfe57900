//! Structured Logger
//!
//! Wraps `tracing` with environment-based level control, JSON or pretty
//! console output, and an optional daily-rolling NDJSON file.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    /// Parse a `LOG_FORMAT` value; anything other than `pretty`/`text` is JSON.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Self::Pretty,
            _ => Self::Json,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggerOptions {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
    /// Directory for `linktitle.log.YYYY-MM-DD` files; console only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            log_dir: None,
        }
    }
}

/// Build the filter: `RUST_LOG` wins, then the configured level.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global structured logger.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger(options: &LoggerOptions) {
    let env_filter = build_filter(&options.level);

    let console_layer = match options.format {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_writer(std::io::stdout)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
            .with_ansi(true)
            .boxed(),
    };

    // Rolling file appender: writes NDJSON to `<dir>/linktitle.log.YYYY-MM-DD`
    let file_layer = options.log_dir.as_ref().map(|dir| {
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, "linktitle.log");
        fmt::layer()
            .json()
            .with_writer(appender)
            .with_ansi(false)
            .boxed()
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing() {
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(" TEXT "), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("whatever"), LogFormat::Json);
    }

    #[test]
    fn init_twice_is_harmless() {
        let options = LoggerOptions {
            level: "debug".into(),
            format: LogFormat::Pretty,
            log_dir: None,
        };
        init_logger(&options);
        init_logger(&options);
    }
}
