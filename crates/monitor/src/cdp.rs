//! Low-level Chrome DevTools Protocol client over WebSocket.
//!
//! Talks to a single debuggable target via its `webSocketDebuggerUrl`.
//! Supports sending commands and receiving responses; unsolicited protocol
//! events carry nothing we need (state is pulled by polling) and are ignored.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, warn};

use trackcast_core::{Error, Result, Target};

use crate::session::{PageSession, SessionFactory};

const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// A CDP WebSocket client bound to one target.
pub struct CdpClient {
    /// Sender to write messages to the WebSocket.
    ws_tx: mpsc::Sender<String>,
    /// Pending command responses, keyed by request ID.
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>>,
    /// Auto-incrementing command ID.
    next_id: AtomicU64,
    closed: AtomicBool,
    reader_handle: tokio::task::JoinHandle<()>,
    writer_handle: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to a target's CDP WebSocket endpoint.
    pub async fn connect(ws_url: &str) -> Result<Self> {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::connect_async;
        use tokio_tungstenite::tungstenite::Message;

        let (ws_stream, _) = connect_async(ws_url)
            .await
            .map_err(|e| Error::Connect(format!("{}: {}", ws_url, e)))?;

        let (mut ws_sink, mut ws_read) = ws_stream.split();

        // Channel for outgoing messages
        let (ws_tx, mut ws_rx) = mpsc::channel::<String>(64);

        let pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Value>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let pending_reader = pending.clone();

        // Writer task: owns the sink, forwards messages from the channel
        let writer_handle = tokio::spawn(async move {
            while let Some(msg) = ws_rx.recv().await {
                if let Err(e) = ws_sink.send(Message::Text(msg)).await {
                    error!("CDP WebSocket write error: {}", e);
                    break;
                }
            }
        });

        // Reader task: dispatches responses to their pending oneshot
        let reader_handle = tokio::spawn(async move {
            while let Some(msg_result) = ws_read.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => {
                        if let Ok(val) = serde_json::from_str::<Value>(&text) {
                            if let Some(id) = val.get("id").and_then(|v| v.as_u64()) {
                                let mut pending = pending_reader.lock().await;
                                if let Some(tx) = pending.remove(&id) {
                                    let _ = tx.send(val);
                                }
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("CDP WebSocket closed by server");
                        break;
                    }
                    Err(e) => {
                        warn!("CDP WebSocket read error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        });

        Ok(Self {
            ws_tx,
            pending,
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            reader_handle,
            writer_handle,
        })
    }

    /// Send a CDP command and wait for the response.
    pub async fn send_command(&self, method: &str, params: Value) -> Result<Value> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::Eval(format!("client closed before '{}'", method)));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let msg = json!({
            "id": id,
            "method": method,
            "params": params,
        });

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id, tx);
        }

        self.ws_tx
            .send(msg.to_string())
            .await
            .map_err(|e| Error::Eval(format!("failed to send '{}': {}", method, e)))?;

        match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
            Ok(Ok(response)) => {
                if let Some(error) = response.get("error") {
                    Err(Error::Eval(format!("'{}' failed: {}", method, error)))
                } else {
                    Ok(response.get("result").cloned().unwrap_or(Value::Null))
                }
            }
            Ok(Err(_)) => Err(Error::Eval("response channel closed".to_string())),
            Err(_) => {
                let mut pending = self.pending.lock().await;
                pending.remove(&id);
                Err(Error::Timeout(format!("CDP command '{}' timed out", method)))
            }
        }
    }

    /// Evaluate JavaScript in the page context.
    pub async fn evaluate(&self, expression: &str) -> Result<Value> {
        self.send_command(
            "Runtime.evaluate",
            json!({
                "expression": expression,
                "returnByValue": true,
                "awaitPromise": true,
            }),
        )
        .await
    }

    /// Release the connection. Idempotent: safe to call repeatedly, or on a
    /// client whose transport already died.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.reader_handle.abort();
        self.writer_handle.abort();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.close();
    }
}

#[async_trait]
impl PageSession for CdpClient {
    async fn evaluate(&self, expression: &str) -> Result<Value> {
        CdpClient::evaluate(self, expression).await
    }

    fn close(&self) {
        CdpClient::close(self);
    }
}

/// Opens CDP sessions against the WebSocket URL the target listing reported.
pub struct CdpSessionFactory;

#[async_trait]
impl SessionFactory for CdpSessionFactory {
    async fn open(&self, target: &Target) -> Result<Arc<dyn PageSession>> {
        let ws_url = target.ws_url.as_deref().ok_or_else(|| {
            Error::Connect(format!("target {} has no webSocketDebuggerUrl", target.id))
        })?;
        let client = CdpClient::connect(ws_url).await?;
        Ok(Arc::new(client))
    }
}
