//! Collaborator boundary for the JSON-RPC transport.
//!
//! Connection management, request/response correlation, and serialization
//! live in the embedding application; the engine only needs "send a named
//! request and await the correlated result" plus fire-and-forget notify.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("request '{method}' timed out")]
    Timeout { method: String },
    #[error("connection failure: {0}")]
    Connection(String), // Use String for cross-crate compatibility
    #[error("server error {code}: {message}")]
    Server { code: i64, message: String },
}

/// Transport-agnostic JSON-RPC client as seen by the sync engine.
///
/// `call` resolves to the response's `result` value; a JSON-RPC error
/// object from the remote maps to `RpcError::Server`.
#[async_trait]
pub trait RpcClient: Send + Sync {
    async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, RpcError>;
    async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), RpcError>;
}

// Transports are commonly shared with a notification listener, so a shared
// handle works anywhere an owned client does.
#[async_trait]
impl<T: RpcClient + ?Sized> RpcClient for std::sync::Arc<T> {
    async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, RpcError> {
        (**self).call(method, params).await
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), RpcError> {
        (**self).notify(method, params).await
    }
}
