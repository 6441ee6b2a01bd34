//! E-commerce Analytics API Server
//!
//! HTTP API exposing demand, seasonality and lifecycle analyses per product.
//! Products are read from PostgreSQL (`DATABASE_URL`) or, when no database is
//! configured, from a JSON dump (`PRODUCTS_FILE`).

use dotenvy::dotenv;
use ecommerce_analytics::config::Config;
use ecommerce_analytics::core::http::start_server;
use ecommerce_analytics::db::{JsonFileProductStore, PostgresProductStore, ProductStore};
use ecommerce_analytics::logging;
use ecommerce_analytics::metrics::Metrics;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

async fn open_store(config: &Config, metrics: &Metrics) -> Option<Arc<dyn ProductStore>> {
    if let Some(url) = &config.database_url {
        match PostgresProductStore::connect(url).await {
            Ok(store) => {
                info!("PostgreSQL connected for API server");
                metrics.database_connected.set(1.0);
                let store: Arc<dyn ProductStore> = Arc::new(store);
                return Some(store);
            }
            Err(e) => {
                metrics.database_connected.set(0.0);
                warn!(error = %e, "Failed to connect to PostgreSQL");
            }
        }
    }

    if let Some(path) = &config.products_file {
        match JsonFileProductStore::load(path) {
            Ok(store) => {
                let store: Arc<dyn ProductStore> = Arc::new(store);
                return Some(store);
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Failed to load products file");
            }
        }
    }

    None
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let config = Config::from_env();
    info!("Starting E-commerce Analytics API Server");
    info!(environment = %config.environment, "Environment");
    info!(port = config.port, "HTTP Server: http://0.0.0.0:{}", config.port);

    let metrics = Arc::new(Metrics::new()?);
    let store = open_store(&config, &metrics).await;
    if store.is_none() {
        warn!("No product store available - analysis endpoints will return 503");
    }

    let port = config.port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, store, metrics).await {
            error!(error = %e, "HTTP server error");
        }
    });

    info!("API server started, waiting for shutdown signal...");
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutting down API server...");
        }
        _ = server_handle => {
            error!("HTTP server stopped");
        }
    }

    Ok(())
}
