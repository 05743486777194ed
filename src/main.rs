//! Offline mirror service.
//!
//! Synchronizes the dataset at startup and serves the update-aware proxy.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use aod_offline::config::Config;
use aod_offline::db::{self, BlobStore, ResponseCache};
use aod_offline::interceptor::{Interceptor, INTERCEPTOR_BUCKET};
use aod_offline::remote;
use aod_offline::sync::{DatasetSynchronizer, SYNC_BUCKET};
use aod_offline::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting offline mirror");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Version endpoint: {}", config.version_url);
    tracing::info!("Dataset endpoint: {}", config.dataset_url);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let client = remote::http_client()?;

    // Disjoint namespaces: the two writers never share a key
    let synchronizer = Arc::new(DatasetSynchronizer::from_config(
        &config,
        BlobStore::new(pool.clone(), SYNC_BUCKET),
        client.clone(),
    ));
    let interceptor = Arc::new(Interceptor::from_config(
        &config,
        ResponseCache::new(pool, INTERCEPTOR_BUCKET),
        client,
    ));

    if !config.precache_urls.is_empty() {
        if let Err(e) = interceptor.precache(&config.precache_urls).await {
            tracing::warn!("Pre-caching failed: {}", e);
        }
    }

    let state = AppState {
        synchronizer: synchronizer.clone(),
        interceptor,
    };

    // The interceptor runs independently of the dataset sync
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Proxy listening on {}", config.bind_addr);
    let server = tokio::spawn(async move { axum::serve(listener, create_router(state)).await });

    let dataset_bytes = match synchronizer.ensure_fresh_dataset().await {
        Ok(dataset) => dataset.len(),
        Err(e) => {
            tracing::error!("Startup failed, no dataset available: {}", e);
            server.abort();
            return Err(e.into());
        }
    };
    tracing::info!("Dataset ready ({} bytes)", dataset_bytes);

    server.await??;

    Ok(())
}
