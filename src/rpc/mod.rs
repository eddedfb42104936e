//! JSON-RPC plumbing
//!
//! The bridge composes calls against a fixed remote method namespace; this
//! module carries the envelope types, the transport error kind, and the
//! [`Transport`] seam the rest of the crate talks through. The real TCP
//! session lives in [`tcp`]; tests substitute a scripted mock.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

pub mod tcp;

pub use self::tcp::TcpTransport;

/// JSON-RPC 2.0 request envelope
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl RpcRequest {
    pub fn new(id: u64, method: &str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.to_string(),
            params,
        }
    }
}

/// Error object from a JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteError {
    pub code: i64,
    pub message: String,
}

/// An asynchronous notification pushed by the remote target
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl Notification {
    /// The `data` member of the notification params, if any
    pub fn data(&self) -> &Value {
        self.params.get("data").unwrap_or(&Value::Null)
    }
}

/// Transport-level errors
#[derive(Error, Debug, Clone)]
pub enum RpcError {
    #[error("could not connect: {0}")]
    Connect(String),

    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("call timed out")]
    Timeout,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("malformed frame: {0}")]
    Protocol(String),
}

/// A request/response and event-subscription primitive to one remote target.
///
/// Calls are asynchronous and non-blocking; notifications fan out on a
/// broadcast channel so every subscriber sees every event.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a method call and await its result.
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError>;

    /// Subscribe to the asynchronous notification stream.
    fn notifications(&self) -> broadcast::Receiver<Notification>;

    /// Resolves once the underlying session is gone.
    async fn closed(&self);
}
