//! Search API server command.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::{build_service, load_config, open_store, provider};
use crate::web::{AppState, WebServer};

/// Start the HTTP search API.
///
/// `host` and `port` override the `[server]` section of the configuration.
pub async fn run(root: &Path, host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config(root)?;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let embedder = provider(&config)?;
    let provider_name = embedder.provider_name();
    let store = open_store(&config, root).await?;

    let counts = store.counts().await?;
    info!(
        artifacts = counts.artifacts,
        embedded = counts.embedded,
        "Artifact store ready"
    );

    let service = Arc::new(build_service(&config, embedder, store));
    let server = WebServer::new(AppState::new(service, provider_name));

    println!("Serving search API on http://{}", addr);
    server.start(addr).await
}
