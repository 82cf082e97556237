//! # HTTP JSON-RPC Server Prelude
//!
//! ```rust
//! use turul_http_json_rpc_server::prelude::*;
//! ```

// Core server types
pub use crate::handler::JsonRpcHttpHandler;
pub use crate::server::{HttpJsonRpcServer, HttpJsonRpcServerBuilder, ServerConfig};

// Re-export foundational types
pub use crate::{BoxError, JsonRpcDispatcher, JsonRpcErrorObject};

// Error types
pub use crate::{HttpJsonRpcError, Result};
