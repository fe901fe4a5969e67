//! Relay Gateway - Main entry point.

use anyhow::Result;
use relay_common::config::{load_dotenv, Config, ConfigSource};
use relay_common::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Credentials may come from a local .env file
    let dotenv = load_dotenv();

    let (config, source) = Config::load_with_env()?;

    init_logging(&config.observability.log_level, &config.observability.log_format);

    tracing::info!("Relay Gateway v{}", env!("CARGO_PKG_VERSION"));
    match dotenv {
        Ok(Some(path)) => tracing::debug!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to load .env file"),
    }
    match source {
        ConfigSource::File(path) => tracing::info!("Loaded config from {}", path.display()),
        ConfigSource::Defaults => tracing::info!("Config file not found, using defaults"),
    }

    relay_gateway::start_server(&config).await
}
