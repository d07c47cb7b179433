//! # keepsake-server
//!
//! Self-hosted wedding-album backend.
//!
//! This binary provides:
//! - **REST API** (axum) the gallery client consumes: list, fetch,
//!   download, thumbnail, upload, delete
//! - **Filesystem blob storage** with an in-memory metadata registry
//!   (records do not survive a restart; blobs do)
//! - **Optional mirroring** of each upload to an external blob sink
//! - **Per-IP rate limiting** to protect the public endpoints

mod api;
mod config;
mod error;
mod mirror;
mod rate_limit;
mod thumbnail;
mod upload;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use keepsake_store::{BlobStore, MediaRegistry};

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::mirror::MirrorClient;
use crate::rate_limit::RateLimiter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,keepsake_server=debug")),
        )
        .init();

    info!("Starting Keepsake album server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Blob store (creates the media directory if missing) and the registry
    // that owns it.
    let blobs = BlobStore::open(config.media_storage_path.clone()).await?;
    let media = Arc::new(MediaRegistry::new(blobs));

    // Optional mirror sink.
    let mirror = config.mirror_url.clone().map(|url| {
        info!(url = %url, "Mirroring uploads to external sink");
        Arc::new(MirrorClient::new(url))
    });

    // Rate limiter: 10 req/s sustained, burst of 30.
    let rate_limiter = RateLimiter::default();

    let state = AppState {
        media,
        mirror,
        rate_limiter: rate_limiter.clone(),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic rate limiter cleanup (every 5 minutes, evict buckets idle
    // >10 min).
    let rl = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rl.evict_idle(600.0).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
