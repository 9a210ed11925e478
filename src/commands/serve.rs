// src/commands/serve.rs
//! `serve` command

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use wpsyde::server::{run_server, ServerConfig};

pub fn cmd_serve(bind: &str, dir: PathBuf) -> Result<()> {
    let bind_addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", bind))?;

    let config = ServerConfig { bind_addr, root: dir };
    println!("Serving {} on http://{}", config.root.display(), config.bind_addr);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(run_server(config))
}
