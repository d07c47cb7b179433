//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Filesystem path where uploaded media bytes are stored.
    /// Env: `MEDIA_STORAGE_PATH`
    /// Default: `./media`
    pub media_storage_path: PathBuf,

    /// Ceiling on an upload request body, in bytes (50 MiB).
    /// Env: `MAX_UPLOAD_SIZE`
    pub max_upload_size: usize,

    /// Human-readable name for this album instance.
    /// Env: `INSTANCE_NAME`
    /// Default: `"Keepsake Album"`
    pub instance_name: String,

    /// Upload endpoint of the optional external mirror sink.  Unset
    /// disables mirroring entirely.
    /// Env: `MIRROR_URL`
    /// Default: none.
    pub mirror_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8080).into(),
            media_storage_path: PathBuf::from("./media"),
            max_upload_size: 50 * 1024 * 1024, // 50 MiB
            instance_name: "Keepsake Album".to_string(),
            mirror_url: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(
                    value = %addr,
                    "Invalid HTTP_ADDR, using default"
                );
            }
        }

        if let Ok(path) = std::env::var("MEDIA_STORAGE_PATH") {
            config.media_storage_path = PathBuf::from(path);
        }

        if let Ok(val) = std::env::var("MAX_UPLOAD_SIZE") {
            if let Ok(n) = val.parse::<usize>() {
                config.max_upload_size = n;
            } else {
                tracing::warn!(
                    value = %val,
                    "Invalid MAX_UPLOAD_SIZE, using default"
                );
            }
        }

        if let Ok(name) = std::env::var("INSTANCE_NAME") {
            config.instance_name = name;
        }

        if let Ok(url) = std::env::var("MIRROR_URL") {
            if !url.is_empty() {
                config.mirror_url = Some(url);
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}
