//! Transport layer for the JSON-RPC client
//!
//! A transport moves one encoded payload to the peer and returns the raw
//! reply. Failures never escape as errors: a transport turns them into an
//! encoded error response so they reach the caller through the same path as
//! a remote error.

use async_trait::async_trait;
use turul_json_rpc_server::{JsonRpcErrorObject, JsonRpcResponse};

pub mod http;
pub mod local;

// Re-export transport implementations
pub use http::HttpTransport;
pub use local::LocalTransport;

/// Transport type enumeration
#[derive(Debug, Clone, PartialEq)]
pub enum TransportType {
    /// HTTP POST exchange
    Http,
    /// Direct hand-off to a dispatcher in the same process
    Local,
}

impl std::fmt::Display for TransportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportType::Http => write!(f, "HTTP"),
            TransportType::Local => write!(f, "Local"),
        }
    }
}

/// Transport statistics for monitoring
#[derive(Debug, Clone, Default)]
pub struct TransportStatistics {
    /// Number of payloads sent
    pub requests_sent: u64,
    /// Number of non-empty replies received
    pub responses_received: u64,
    /// Number of failures turned into synthesized responses
    pub errors: u64,
    /// Last error message
    pub last_error: Option<String>,
}

/// Byte-in/byte-out channel to a JSON-RPC peer.
///
/// Implementations must tolerate concurrent `execute` calls: the batching
/// client flushes from a background task while other calls are in flight.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Get transport type
    fn transport_type(&self) -> TransportType;

    /// Send an encoded request (or batch) and return the encoded reply.
    /// An empty reply means the peer had nothing to say.
    async fn execute(&self, request: Vec<u8>) -> Vec<u8>;

    /// Get transport statistics
    fn statistics(&self) -> TransportStatistics {
        TransportStatistics::default()
    }
}

/// Type alias for a shared transport
pub type SharedTransport = std::sync::Arc<dyn Transport>;

/// Encode a response addressed to nobody carrying `error`
pub(crate) fn synthesize_error(error: JsonRpcErrorObject) -> Vec<u8> {
    serde_json::to_vec(&JsonRpcResponse::error(None, error)).unwrap_or_default()
}
