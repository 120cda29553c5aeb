use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use voke::cli::{handle_command, Cli};

const DEFAULT_LOG_FILTER: &str = "voke=info,rocket::server=off";

/// `LOG_FORMAT=json` switches to JSON lines; `LOG_FILE` sends output to a file
/// (truncated on startup) instead of stderr.
fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let layer = match std::env::var("LOG_FILE") {
        Ok(path) => {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            let layer = fmt::layer().with_writer(Mutex::new(file)).with_ansi(false);
            if json {
                layer
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .boxed()
            } else {
                layer.boxed()
            }
        }
        Err(_) => {
            let layer = fmt::layer().with_writer(std::io::stderr);
            if json {
                layer.json().boxed()
            } else {
                layer.boxed()
            }
        }
    };

    tracing_subscriber::registry().with(layer).with(filter).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse();
    handle_command(cli).await
}
