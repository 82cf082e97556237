//! # HTTP JSON-RPC Server
//!
//! HTTP binding for a [`JsonRpcDispatcher`]: every `POST` to the configured
//! path is one JSON-RPC payload, and whatever the dispatcher returns is
//! written back verbatim as `application/json`.
//!
//! ## Features
//! - hyper 1.x server, one task per connection
//! - Bounded request bodies
//! - Builder that registers handlers straight on the dispatcher

pub mod handler;
pub mod prelude;
pub mod server;

// Re-export main types
pub use handler::JsonRpcHttpHandler;
pub use server::{HttpJsonRpcServer, HttpJsonRpcServerBuilder, ServerConfig};

// Re-export foundational types
pub use turul_json_rpc_server::{BoxError, JsonRpcDispatcher, JsonRpcErrorObject, MethodHandler};

/// Result type for HTTP JSON-RPC server operations
pub type Result<T> = std::result::Result<T, HttpJsonRpcError>;

/// HTTP JSON-RPC server errors
#[derive(Debug, thiserror::Error)]
pub enum HttpJsonRpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
