//! Static overlay asset server.
//!
//! Serves the overlay directory over plain HTTP so a capture tool can embed
//! it; `/` falls back to `overlay.html`.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::Router;
use tokio::sync::broadcast;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

use trackcast_core::{Error, Result};

pub async fn serve(
    dir: PathBuf,
    addr: SocketAddr,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "overlay directory missing, overlay server disabled");
        return Ok(());
    }

    let index = ServeFile::new(dir.join("overlay.html"));
    let app = Router::new().fallback_service(ServeDir::new(&dir).fallback(index));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Config(format!("overlay bind {}: {}", addr, e)))?;
    info!(%addr, dir = %dir.display(), "overlay server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
        .map_err(Error::Io)?;
    Ok(())
}
