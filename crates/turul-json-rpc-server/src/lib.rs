//! # JSON-RPC 2.0 Server Implementation
//!
//! A transport-agnostic JSON-RPC 2.0 message model and dispatch engine.
//! Bytes go in, bytes come out; HTTP or any other channel is a thin
//! adapter on top.
//!
//! ## Features
//! - Request, response and error envelopes with lazily decoded payloads
//! - Statically typed method handlers registered by name
//! - Single and batch requests, with notification semantics
//!
//! ```rust
//! use turul_json_rpc_server::JsonRpcDispatcher;
//!
//! # async fn run() {
//! let mut dispatcher = JsonRpcDispatcher::new();
//! dispatcher.handle_func("add", |(a, b): (i64, i64)| async move {
//!     Ok::<_, turul_json_rpc_server::BoxError>(a + b)
//! });
//!
//! let output = dispatcher
//!     .handle(br#"{"jsonrpc":"2.0","id":1,"method":"add","params":[2,3]}"#)
//!     .await;
//! assert_eq!(output, br#"{"jsonrpc":"2.0","id":1,"result":5}"#);
//! # }
//! ```

pub mod dispatch;
pub mod error;
pub mod handler;
pub mod prelude;
pub mod request;
pub mod response;
pub mod types;

// Re-export main types
pub use dispatch::JsonRpcDispatcher;
pub use error::{JsonRpcErrorCode, JsonRpcErrorObject};
pub use handler::{BoxError, HandlerResult, MethodHandler};
pub use request::JsonRpcRequest;
pub use response::JsonRpcResponse;
pub use types::{Cardinality, JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i32 = -32099;
    pub const SERVER_ERROR_END: i32 = -32000;

    /// Transport failure synthesized by the client
    pub const SERVER_ERROR: i32 = -32000;
}
