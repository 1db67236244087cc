//! Snapshot fan-out over WebSocket.
//!
//! Backed by a broadcast channel: every published frame goes to all currently
//! connected subscribers, subscribers that are closed or lagging are skipped
//! silently, and late joiners only see frames published after they subscribed.

use std::net::SocketAddr;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{info, warn};

use trackcast_core::{Error, Result, Snapshot, WireSnapshot};

/// Fan-out handle for the latest wire snapshot. Cheap to clone.
#[derive(Clone)]
pub struct Publisher {
    tx: broadcast::Sender<String>,
}

impl Publisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Serialize and broadcast one state. `None` publishes the idle frame.
    pub fn publish(&self, snapshot: Option<&Snapshot>) {
        let frame = WireSnapshot::from_snapshot(snapshot);
        match serde_json::to_string(&frame) {
            // send only fails when nobody is subscribed; that is not an error.
            Ok(json) => {
                let _ = self.tx.send(json);
            }
            Err(e) => warn!(error = %e, "failed to serialize snapshot frame"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Serve `GET /ws` upgrades until shutdown, forwarding every published frame
/// to each connected client.
pub async fn serve(
    publisher: Publisher,
    addr: SocketAddr,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let app = Router::new()
        .route("/ws", get(handle_ws_upgrade))
        .with_state(publisher);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Config(format!("publisher bind {}: {}", addr, e)))?;
    info!(%addr, "publisher listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
        .map_err(Error::Io)?;
    Ok(())
}

async fn handle_ws_upgrade(
    ws: WebSocketUpgrade,
    State(publisher): State<Publisher>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, publisher))
}

async fn handle_ws_connection(socket: WebSocket, publisher: Publisher) {
    info!("subscriber connected");

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut frames = publisher.subscribe();

    // Task: forward published frames to this subscriber
    let send_task = tokio::spawn(async move {
        loop {
            match frames.recv().await {
                Ok(frame) => {
                    if ws_sender.send(WsMessage::Text(frame)).await.is_err() {
                        break;
                    }
                }
                // A lagged subscriber just misses frames; the next one is
                // fresher anyway.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Drain (and ignore) anything the subscriber sends; exit on close.
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(WsMessage::Close(_)) | Err(_) => break,
            _ => {}
        }
    }

    send_task.abort();
    info!("subscriber disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(title: &str) -> Snapshot {
        Snapshot {
            title: title.to_string(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            artwork_url: Some("https://example.com/a.jpg".to_string()),
            position_seconds: 1.0,
            duration_seconds: 2.0,
            paused: false,
        }
    }

    #[tokio::test]
    async fn test_fan_out_to_all_subscribers_in_order() {
        let publisher = Publisher::new(16);
        let mut a = publisher.subscribe();
        let mut b = publisher.subscribe();

        publisher.publish(Some(&snapshot("One")));
        publisher.publish(None);

        for rx in [&mut a, &mut b] {
            let first: serde_json::Value =
                serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
            assert_eq!(first["title"], "One");
            assert_eq!(first["albumArt"], "https://example.com/a.jpg");

            let second = rx.recv().await.unwrap();
            assert_eq!(second, "{}");
        }
    }

    #[tokio::test]
    async fn test_late_joiner_gets_no_replay() {
        let publisher = Publisher::new(16);
        publisher.publish(Some(&snapshot("Early")));

        let mut late = publisher.subscribe();
        publisher.publish(Some(&snapshot("Late")));

        let frame: serde_json::Value =
            serde_json::from_str(&late.recv().await.unwrap()).unwrap();
        assert_eq!(frame["title"], "Late");
        assert!(late.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let publisher = Publisher::new(16);
        assert_eq!(publisher.subscriber_count(), 0);
        publisher.publish(Some(&snapshot("Nobody")));
        publisher.publish(None);
    }
}
