mod app;
mod resolve_cmd;
mod terminal_output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use linktitle_config::ServiceConfig;
use logging::{init_logger, LogFormat, LoggerOptions};

use terminal_output::note_error;

#[derive(Parser)]
#[command(name = "linktitle")]
#[command(about = "linktitle: resolve URLs into human-readable titles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind the HTTP server to
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Resolve URLs once and print the titles
    Resolve {
        urls: Vec<String>,
        /// Bare video identifier (repeatable)
        #[arg(long = "video-id")]
        video_ids: Vec<String>,
        /// Print raw JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration with credentials masked
    Config,
}

fn logger_options(config: &ServiceConfig, quiet: bool) -> LoggerOptions {
    let level = if quiet && !config.logging.debug {
        "warn".to_string()
    } else {
        config.logging.effective_level().to_string()
    };
    LoggerOptions {
        level,
        format: LogFormat::parse(&config.logging.format),
        log_dir: config.logging.dir.clone(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = ServiceConfig::from_env();

    match cli.command {
        Commands::Serve { port, bind } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            init_logger(&logger_options(&config, false));
            linktitle_config::check(&config)?;
            app::run_server(config).await?;
        }
        Commands::Resolve {
            urls,
            video_ids,
            json,
        } => {
            init_logger(&logger_options(&config, true));
            if let Err(e) = linktitle_config::check(&config) {
                note_error(&e.to_string());
                return Err(e);
            }
            resolve_cmd::run(&config, urls, video_ids, json).await?;
        }
        Commands::Config => {
            let report = linktitle_config::validate(&config);
            println!("{}", serde_json::to_string_pretty(&config.redacted())?);
            for warning in &report.warnings {
                terminal_output::note_warn(&format!("{}: {}", warning.path, warning.message));
            }
            for error in &report.errors {
                note_error(&format!("{}: {}", error.path, error.message));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["linktitle", "serve", "--port", "9000"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000), bind: None }));

        let cli = Cli::try_parse_from([
            "linktitle",
            "resolve",
            "https://youtu.be/abc",
            "--video-id",
            "xyz",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Resolve { urls, video_ids, json } => {
                assert_eq!(urls, vec!["https://youtu.be/abc"]);
                assert_eq!(video_ids, vec!["xyz"]);
                assert!(json);
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn one_shot_commands_log_quietly() {
        let config = ServiceConfig::default();
        assert_eq!(logger_options(&config, true).level, "warn");
        assert_eq!(logger_options(&config, false).level, "info");

        let mut debug = ServiceConfig::default();
        debug.logging.debug = true;
        assert_eq!(logger_options(&debug, true).level, "debug");
    }
}
