// src/server/mod.rs

//! Local registry server
//!
//! Serves a registry directory over HTTP the way the static host does, so
//! the CLI can be pointed at `http://127.0.0.1:<port>` during development:
//! - `/` redirects to `/index.json`
//! - `/index.json`, `/health.json`, `/public-key.pem`, `/_headers`
//! - `/components/<name>/<version>/{manifest.json,component.zip}`
//!
//! Cache headers follow the production policy (short for the index,
//! immutable for versioned assets).

mod routes;

pub use routes::create_router;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,
    /// Registry directory to serve
    pub root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3001)),
            root: PathBuf::from("registry"),
        }
    }
}

/// Shared server state
#[derive(Debug)]
pub struct ServerState {
    pub root: PathBuf,
}

/// Start the registry server and serve until the process ends
pub async fn run_server(config: ServerConfig) -> Result<()> {
    if !config.root.is_dir() {
        anyhow::bail!("Registry directory not found: {}", config.root.display());
    }

    tracing::info!("Serving registry {} on http://{}", config.root.display(), config.bind_addr);

    let state = Arc::new(ServerState {
        root: config.root.clone(),
    });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    axum::serve(listener, app).await?;
    Ok(())
}
