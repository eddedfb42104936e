//! Reconnection Supervisor
//!
//! One supervisor per configured device. The remote appliance may be powered
//! off or asleep at any time, so connection loss is an expected state:
//! connect, register, hand the session to the notifier, and when the
//! transport dies, pull the dead handle out of the registry and try again on
//! a fixed interval, forever.

use crate::config::DeviceConfig;
use crate::connection::Connection;
use crate::notifier::EventNotifier;
use crate::registry::DeviceRegistry;
use crate::rpc::{RpcError, TcpTransport};
use crate::triggers::{TriggerBus, TriggerEvent};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::{info, warn};

/// Produces a fresh connection to a device. A seam so tests can script
/// connect outcomes without sockets.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, device: &DeviceConfig) -> Result<Arc<Connection>, RpcError>;
}

/// The real connector: plain TCP JSON-RPC
pub struct TcpConnector {
    call_timeout: Duration,
}

impl TcpConnector {
    pub fn new(call_timeout: Duration) -> Self {
        Self { call_timeout }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, device: &DeviceConfig) -> Result<Arc<Connection>, RpcError> {
        let transport =
            TcpTransport::connect(&device.host, device.tcp_port, self.call_timeout).await?;
        Ok(Arc::new(Connection::new(
            &device.host,
            device.http_port,
            &device.name,
            Arc::new(transport),
        )))
    }
}

pub struct Supervisor {
    registry: Arc<DeviceRegistry>,
    bus: TriggerBus,
    connector: Arc<dyn Connector>,
    device: DeviceConfig,
    retry_interval: Duration,
}

impl Supervisor {
    pub fn new(
        registry: Arc<DeviceRegistry>,
        bus: TriggerBus,
        connector: Arc<dyn Connector>,
        device: DeviceConfig,
        retry_interval: Duration,
    ) -> Self {
        Self {
            registry,
            bus,
            connector,
            device,
            retry_interval,
        }
    }

    /// Run the supervise loop until the task is dropped.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut lost_before = false;
            loop {
                let conn = self.establish().await;
                self.registry.register(conn.clone());
                let _ = EventNotifier::attach(conn.clone(), self.bus.clone());

                if lost_before {
                    self.bus.emit(TriggerEvent::Reconnected {
                        host: conn.host().to_string(),
                    });
                }

                conn.closed().await;
                warn!("📡 Lost connection to {}", conn.host());

                // The dead handle must leave the registry before the next
                // attempt is scheduled, so nothing resolves to it meanwhile.
                self.registry.remove(conn.host());
                lost_before = true;
            }
        })
    }

    /// Connect, retrying on the fixed interval until it works. No backoff,
    /// no attempt cap.
    async fn establish(&self) -> Arc<Connection> {
        let strategy = FixedInterval::new(self.retry_interval);
        Retry::spawn(strategy, || self.try_connect())
            .await
            .expect("fixed-interval retry never exhausts")
    }

    async fn try_connect(&self) -> Result<Arc<Connection>, RpcError> {
        match self.connector.connect(&self.device).await {
            Ok(conn) => {
                info!(
                    "✅ Connected to {} ({}:{})",
                    self.device.name, self.device.host, self.device.tcp_port
                );
                Ok(conn)
            }
            Err(e) => {
                warn!("Connect to {} failed: {}", self.device.host, e);
                Err(e)
            }
        }
    }
}
