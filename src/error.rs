// Error taxonomy surfaced to callers of the client, plus transport-internal errors

use thiserror::Error;

/// Request-level failures. Transport trouble never shows up here directly; a request
/// caught in a dropped session ends as `Timeout` (or `Disconnected` under the eager policy).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not connected")]
    NotConnected,
    #[error("request '{action}' timed out after {after_ms} ms")]
    Timeout { action: &'static str, after_ms: u64 },
    #[error("server error: {0}")]
    ServerError(String),
    #[error("session lost before a response arrived")]
    Disconnected,
    #[error("unexpected response payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Timeout { .. })
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("session closed")]
    Closed,
}
