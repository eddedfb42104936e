//! Connection Registry
//!
//! Holds the set of live connections, keyed by host identity, and resolves a
//! logical device reference to one of them. Registration order is preserved;
//! at most one connection per host is ever retained.

use crate::connection::Connection;
use crate::error::{BridgeError, BridgeResult};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Single-device convenience mode: when exactly one connection is registered,
/// `resolve` returns it for *any* reference, matching the common one-target
/// household setup. Explicit host resolution only kicks in once a second
/// device is paired.
pub const SINGLE_DEVICE_CONVENIENCE: bool = true;

/// A logical reference to a registered device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceRef {
    /// No preference; degrades to "the only device" when one is registered
    Any,
    /// A concrete host identity
    Host(String),
}

impl DeviceRef {
    pub fn from_option(host: Option<&str>) -> Self {
        match host {
            Some(h) if !h.trim().is_empty() => DeviceRef::Host(h.to_string()),
            _ => DeviceRef::Any,
        }
    }
}

/// Ordered set of live connections, host-unique
#[derive(Default)]
pub struct DeviceRegistry {
    connections: RwLock<Vec<Arc<Connection>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a connection, replacing any prior entry for the same host.
    pub fn register(&self, conn: Arc<Connection>) {
        let mut connections = self.connections.write().expect("registry lock poisoned");
        connections.retain(|c| c.host() != conn.host());
        info!("📺 Registered device {}", conn.host());
        connections.push(conn);
    }

    /// Remove every entry with the given host. No-op when absent.
    pub fn remove(&self, host: &str) {
        let mut connections = self.connections.write().expect("registry lock poisoned");
        let before = connections.len();
        connections.retain(|c| c.host() != host);
        if connections.len() != before {
            info!("📴 Removed device {}", host);
        }
    }

    /// Resolve a device reference to a live connection.
    pub fn resolve(&self, device: &DeviceRef) -> BridgeResult<Arc<Connection>> {
        let connections = self.connections.read().expect("registry lock poisoned");

        if SINGLE_DEVICE_CONVENIENCE && connections.len() == 1 {
            return Ok(connections[0].clone());
        }

        let found = match device {
            DeviceRef::Any => None,
            DeviceRef::Host(host) => connections.iter().find(|c| c.host() == host).cloned(),
        };

        found.ok_or_else(|| {
            debug!("No connection for {:?}", device);
            BridgeError::DeviceNotFound
        })
    }

    pub fn len(&self) -> usize {
        self.connections.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
