//! # JSON-RPC Server Prelude
//!
//! This module provides convenient re-exports of the most commonly used types
//! from the JSON-RPC server library.
//!
//! ```rust
//! use turul_json_rpc_server::prelude::*;
//! ```

// Core JSON-RPC types
pub use crate::dispatch::JsonRpcDispatcher;
pub use crate::error::{JsonRpcErrorCode, JsonRpcErrorObject};
pub use crate::handler::{BoxError, HandlerResult, MethodHandler};
pub use crate::request::JsonRpcRequest;
pub use crate::response::JsonRpcResponse;
pub use crate::types::{Cardinality, JsonRpcVersion, RequestId};

// Standard error codes
pub use crate::error_codes::*;
