//! EasyDonate callback server.
//!
//! Loads configuration from the environment (and `.env`), refuses to start
//! without an API key, then serves `POST /easydonate/handler` over HTTP or
//! HTTPS until SIGINT/SIGTERM.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use easydonate::{router, server, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("callback_server_starting");

    let config = Config::load();
    info!(
        api_key_configured = !config.api_key.is_empty(),
        host_ip = %config.host_ip,
        port = config.port,
        use_https = config.use_https,
        tls_passphrase_set = !config.tls.passphrase.is_empty(),
        "config_loaded"
    );

    config.validate().context("Invalid configuration")?;

    let state = AppState::new(config.clone()).context("Failed to create callback verifier")?;
    let app = router(state);

    server::run(&config, app, server::shutdown_signal())
        .await
        .context("Server error")?;

    info!("callback_server_shutdown_complete");

    Ok(())
}
