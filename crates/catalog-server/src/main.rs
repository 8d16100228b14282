//! # Catalog Server
//!
//! Main entry point for the product catalog service.

use anyhow::Context;
use catalog_config::ConfigLoader;
use catalog_server::{
    startup::{print_banner, shutdown_signal},
    Application,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let loader = ConfigLoader::from_default_location().context("failed to load configuration")?;
    let config = loader.get().await;

    catalog_core::init_tracing(&config.observability).context("failed to initialise tracing")?;
    catalog_jobs::register_metrics();
    catalog_service::metrics::register_metrics();

    print_banner();
    info!("Starting {} v{}", config.app.name, env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.environment);
    info!("Queue backend: {:?}", config.queue.backend);

    let app = Application::build(config)
        .await
        .context("failed to initialise application")?;
    app.run(shutdown_signal()).await.context("server error")?;

    Ok(())
}
