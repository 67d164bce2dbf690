use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use farmtrade_rs::{
    create_app, init_observability,
    repositories::open_key_value_store,
    services::{CartDirectory, CategoryService},
    shutdown_observability, AppState, Config, Metrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_environment().context("Failed to load configuration")?;

    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        config.observability.otlp_endpoint.as_deref(),
        &config.observability.log_level,
        config.observability.enable_json_logging,
    )?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );

    let metrics = Arc::new(Metrics::new()?);

    let category_service = CategoryService::load_from_path(&config.catalog.catalog_path)
        .await
        .with_metrics(metrics.clone());
    info!(
        source = %category_service.source(),
        path = %config.catalog.catalog_path,
        "Crop catalog ready"
    );

    let storage = open_key_value_store(&config.storage, metrics.clone())
        .await
        .context("Failed to open cart storage")?;
    let cart_directory = Arc::new(CartDirectory::new(storage, metrics.clone()));

    let app = create_app(AppState {
        metrics,
        category_service: Arc::new(category_service),
        cart_directory,
        service_name: config.observability.service_name.clone(),
        service_version: config.observability.service_version.clone(),
        max_request_size: config.server.max_request_size,
        request_timeout: config.server.request_timeout(),
    });

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .with_context(|| format!("Invalid host address: {}", config.server.host))?,
        config.server.port,
    );
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Server listening on {}", addr);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    shutdown_observability().await;
    info!("Server shutdown complete");
    Ok(())
}
