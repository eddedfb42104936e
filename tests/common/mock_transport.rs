//! Mock Transport for Testing
//!
//! Scripted responses per method, recorded calls, and a push side for
//! injecting notifications and simulating connection loss.

use async_trait::async_trait;
use kodilink::rpc::{Notification, RpcError, Transport};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::{broadcast, watch};

pub struct MockTransport {
    responses: Mutex<HashMap<String, VecDeque<Result<Value, RpcError>>>>,
    calls: Mutex<Vec<(String, Value)>>,
    notify_tx: broadcast::Sender<Notification>,
    closed_tx: watch::Sender<bool>,
    closed_rx: watch::Receiver<bool>,
}

impl MockTransport {
    pub fn new() -> Self {
        let (notify_tx, _) = broadcast::channel(16);
        let (closed_tx, closed_rx) = watch::channel(false);
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            notify_tx,
            closed_tx,
            closed_rx,
        }
    }

    /// Script the next response for a method (queued in call order)
    pub fn respond(&self, method: &str, result: Value) {
        self.responses
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(Ok(result));
    }

    /// Script the next call to a method to fail
    pub fn fail(&self, method: &str, error: RpcError) {
        self.responses
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(Err(error));
    }

    /// All calls issued so far, in order
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }

    /// Params of every call to one method
    pub fn calls_to(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn was_called(&self, method: &str) -> bool {
        !self.calls_to(method).is_empty()
    }

    /// Inject a notification as if the remote pushed it
    pub fn push_notification(&self, method: &str, params: Value) {
        let _ = self.notify_tx.send(Notification {
            method: method.to_string(),
            params,
        });
    }

    /// Simulate the transport dying
    pub fn simulate_close(&self) {
        let _ = self.closed_tx.send(true);
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params));

        match self
            .responses
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(|queue| queue.pop_front())
        {
            Some(outcome) => outcome,
            None => Err(RpcError::Remote {
                code: -32601,
                message: format!("unscripted method: {}", method),
            }),
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
