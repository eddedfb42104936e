#![allow(dead_code)]

pub mod mock_speech;
pub mod mock_transport;

use kodilink::config::Config;
use kodilink::connection::Connection;
use kodilink::orchestrator::Orchestrator;
use kodilink::registry::DeviceRegistry;
use self::mock_transport::MockTransport;
use std::sync::Arc;

/// A connection backed by the given mock transport
pub fn connection(host: &str, transport: Arc<MockTransport>) -> Arc<Connection> {
    Arc::new(Connection::new(host, 8080, host, transport))
}

/// Registry with one mocked device plus an orchestrator over it
pub fn single_device(transport: Arc<MockTransport>) -> (Arc<DeviceRegistry>, Orchestrator) {
    let registry = Arc::new(DeviceRegistry::new());
    registry.register(connection("test-device", transport));
    let orchestrator = Orchestrator::new(registry.clone(), &Config::default());
    (registry, orchestrator)
}
