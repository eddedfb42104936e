//! TCP JSON-RPC session
//!
//! The remote target speaks JSON-RPC 2.0 over a plain TCP socket: requests
//! and responses are bare JSON objects written back to back with no framing,
//! and the same socket pushes unsolicited notifications. A reader task splits
//! the byte stream into objects, correlates responses to pending calls by id,
//! and fans notifications out on a broadcast channel.

use crate::rpc::{Notification, RemoteError, RpcError, RpcRequest, Transport};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Notifications buffered per subscriber before lagging
const NOTIFY_CHANNEL_CAPACITY: usize = 64;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, RpcError>>>>>;

/// One live JSON-RPC session over TCP
pub struct TcpTransport {
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    pending: PendingMap,
    next_id: AtomicU64,
    notify_tx: broadcast::Sender<Notification>,
    closed_rx: watch::Receiver<bool>,
    call_timeout: Duration,
}

impl TcpTransport {
    /// Connect to `host:port` and start the reader task.
    pub async fn connect(host: &str, port: u16, call_timeout: Duration) -> Result<Self, RpcError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| RpcError::Connect(e.to_string()))?;
        let (reader, writer) = stream.into_split();

        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (notify_tx, _) = broadcast::channel(NOTIFY_CHANNEL_CAPACITY);
        let (closed_tx, closed_rx) = watch::channel(false);

        spawn_reader(reader, pending.clone(), notify_tx.clone(), closed_tx);

        Ok(Self {
            writer: tokio::sync::Mutex::new(writer),
            pending,
            next_id: AtomicU64::new(1),
            notify_tx,
            closed_rx,
            call_timeout,
        })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);
        let payload =
            serde_json::to_vec(&request).map_err(|e| RpcError::Protocol(e.to_string()))?;

        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("pending lock poisoned")
            .insert(id, tx);

        {
            let mut writer = self.writer.lock().await;
            if writer.write_all(&payload).await.is_err() {
                self.pending
                    .lock()
                    .expect("pending lock poisoned")
                    .remove(&id);
                return Err(RpcError::ConnectionClosed);
            }
        }
        debug!("→ {} (id {})", method, id);

        match timeout(self.call_timeout, rx).await {
            Ok(Ok(result)) => result,
            // Reader task dropped the sender while tearing down
            Ok(Err(_)) => Err(RpcError::ConnectionClosed),
            Err(_) => {
                self.pending
                    .lock()
                    .expect("pending lock poisoned")
                    .remove(&id);
                warn!("⏱️ '{}' timed out after {:?}", method, self.call_timeout);
                Err(RpcError::Timeout)
            }
        }
    }

    fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notify_tx.subscribe()
    }

    async fn closed(&self) {
        let mut rx = self.closed_rx.clone();
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

fn spawn_reader(
    mut reader: tokio::net::tcp::OwnedReadHalf,
    pending: PendingMap,
    notify_tx: broadcast::Sender<Notification>,
    closed_tx: watch::Sender<bool>,
) {
    tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => {
                    buf.extend_from_slice(&chunk[..n]);
                    for frame in extract_frames(&mut buf) {
                        dispatch_frame(&frame, &pending, &notify_tx);
                    }
                }
                Err(e) => {
                    warn!("📡 Socket read failed: {}", e);
                    break;
                }
            }
        }

        // Fail every outstanding call before announcing the close, so no
        // caller observes a closed session with its call still pending.
        let waiters: Vec<_> = {
            let mut pending = pending.lock().expect("pending lock poisoned");
            pending.drain().map(|(_, tx)| tx).collect()
        };
        for tx in waiters {
            let _ = tx.send(Err(RpcError::ConnectionClosed));
        }
        let _ = closed_tx.send(true);
    });
}

fn dispatch_frame(
    frame: &[u8],
    pending: &PendingMap,
    notify_tx: &broadcast::Sender<Notification>,
) {
    let value: Value = match serde_json::from_slice(frame) {
        Ok(v) => v,
        Err(e) => {
            warn!("Dropping malformed frame: {}", e);
            return;
        }
    };

    // Response: correlate by id
    if let Some(id) = value.get("id").and_then(Value::as_u64) {
        let waiter = pending
            .lock()
            .expect("pending lock poisoned")
            .remove(&id);
        if let Some(tx) = waiter {
            let outcome = if let Some(err) = value.get("error") {
                match serde_json::from_value::<RemoteError>(err.clone()) {
                    Ok(remote) => Err(RpcError::Remote {
                        code: remote.code,
                        message: remote.message,
                    }),
                    Err(_) => Err(RpcError::Protocol(err.to_string())),
                }
            } else {
                Ok(value.get("result").cloned().unwrap_or(Value::Null))
            };
            let _ = tx.send(outcome);
        } else {
            debug!("Response for unknown call id {}", id);
        }
        return;
    }

    // Notification: fan out (no receivers is fine)
    if value.get("method").is_some() {
        match serde_json::from_value::<Notification>(value) {
            Ok(notification) => {
                debug!("🔔 {}", notification.method);
                let _ = notify_tx.send(notification);
            }
            Err(e) => warn!("Dropping malformed notification: {}", e),
        }
    }
}

/// Split complete top-level JSON objects off the front of `buf`.
///
/// The stream has no delimiters, so objects are found by brace depth with
/// string and escape awareness. `buf` keeps any trailing partial object.
fn extract_frames(buf: &mut Vec<u8>) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();

    loop {
        let start = match buf.iter().position(|&b| b == b'{') {
            Some(i) => i,
            None => {
                buf.clear();
                break;
            }
        };

        let mut depth = 0i32;
        let mut in_string = false;
        let mut escaped = false;
        let mut end = None;

        for (i, &b) in buf[start..].iter().enumerate() {
            if in_string {
                if escaped {
                    escaped = false;
                } else if b == b'\\' {
                    escaped = true;
                } else if b == b'"' {
                    in_string = false;
                }
            } else {
                match b {
                    b'"' => in_string = true,
                    b'{' => depth += 1,
                    b'}' => {
                        depth -= 1;
                        if depth == 0 {
                            end = Some(start + i);
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }

        match end {
            Some(e) => {
                frames.push(buf[start..=e].to_vec());
                buf.drain(..=e);
            }
            None => {
                if start > 0 {
                    buf.drain(..start);
                }
                break;
            }
        }
    }

    frames
}
