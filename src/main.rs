use anyhow::Result;
use clap::Parser;
use job_extractor::cli::{handle_command, Cli};
use job_extractor::core::ConfigManager;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "job_extractor=info,rocket::server=off";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging first
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");

    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }

    let cli = Cli::parse();
    let config = ConfigManager::load()?;

    handle_command(cli, config).await
}
