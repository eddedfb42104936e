//! Connection handle
//!
//! One established session to a remote media center. Connections are created
//! by the supervisor on a successful connect and owned by the registry; a
//! reconnect always produces a fresh object, never a mutated one.

use crate::rpc::{Notification, RpcError, Transport};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct Connection {
    host: String,
    /// Auxiliary web-interface port from the device settings, kept alongside
    /// the session for anything that needs to address the HTTP side.
    http_port: u16,
    /// Opaque id of the caller-supplied device record
    device_id: String,
    transport: Arc<dyn Transport>,
}

impl Connection {
    pub fn new(
        host: impl Into<String>,
        http_port: u16,
        device_id: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            host: host.into(),
            http_port,
            device_id: device_id.into(),
            transport,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Issue a remote call on this session
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.transport.call(method, params).await
    }

    /// Subscribe to this session's notification stream
    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.transport.notifications()
    }

    /// Resolves when the session is gone
    pub async fn closed(&self) {
        self.transport.closed().await
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("http_port", &self.http_port)
            .field("device_id", &self.device_id)
            .finish()
    }
}
