//! Serve command implementation

use anyhow::{Context, Result};
use tracing::info;
use vol_dashboard::{handlers, AppState, Config, Dashboard};

pub fn run(config_path: String, host: Option<String>, port: Option<u16>) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async { run_async(config_path, host, port).await })
}

async fn run_async(config_path: String, host: Option<String>, port: Option<u16>) -> Result<()> {
    info!("Starting dashboard server");

    let mut config = Config::load(&config_path).context("Failed to load configuration")?;

    if let Some(host) = host {
        info!("Overriding host to: {}", host);
        config.server.host = host;
    }
    if let Some(port) = port {
        info!("Overriding port to: {}", port);
        config.server.port = port;
    }

    info!("Options data: {}", config.data.options_dir.display());
    info!("CBOE data: {}", config.data.cboe_dir.display());
    info!("Products: {:?}", config.product_keys());

    let dashboard = Dashboard::from_config(config).context("Failed to build page templates")?;
    handlers::serve(AppState::new(dashboard)).await
}
