use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info};

use trackcast_core::{Config, Snapshot};
use trackcast_monitor::{
    CdpSessionFactory, HttpTargetSource, MonitorService, SessionManager, SnapshotSink,
    TracingNotifier,
};
use trackcast_publisher::{overlay, ws, Publisher};

/// Bridges the state machine's sink seam onto the WebSocket publisher.
struct PublisherSink {
    publisher: Publisher,
}

impl SnapshotSink for PublisherSink {
    fn publish(&self, snapshot: Option<&Snapshot>) {
        self.publisher.publish(snapshot);
    }
}

pub async fn run(config_path: &Path) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    info!(
        endpoint = %config.endpoint.list_url(),
        origin = %config.monitor.origin,
        "trackcast monitor starting"
    );

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let publisher = Publisher::new(16);

    let ws_addr: SocketAddr =
        format!("{}:{}", config.publisher.host, config.publisher.port).parse()?;
    let ws_task = tokio::spawn({
        let publisher = publisher.clone();
        let shutdown = shutdown_tx.subscribe();
        async move {
            if let Err(e) = ws::serve(publisher, ws_addr, shutdown).await {
                error!(error = %e, "publisher server failed");
            }
        }
    });

    let overlay_task = if config.overlay.enabled {
        let addr: SocketAddr =
            format!("{}:{}", config.overlay.host, config.overlay.port).parse()?;
        let dir = std::path::PathBuf::from(&config.overlay.dir);
        let shutdown = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = overlay::serve(dir, addr, shutdown).await {
                error!(error = %e, "overlay server failed");
            }
        }))
    } else {
        None
    };

    let manager = SessionManager::new(
        Arc::new(HttpTargetSource::new(config.endpoint.list_url())),
        Arc::new(CdpSessionFactory),
        Arc::new(TracingNotifier),
        Arc::new(PublisherSink { publisher }),
        &config.monitor,
    );
    let service = MonitorService::new(manager, config.monitor.reconcile_interval());
    let monitor_task = tokio::spawn(service.run_loop(shutdown_tx.subscribe()));

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(());

    let _ = monitor_task.await;
    // Open subscriber connections would keep graceful shutdown waiting;
    // the push channel holds no durable state, so drop the servers outright.
    ws_task.abort();
    if let Some(task) = overlay_task {
        task.abort();
    }

    Ok(())
}
