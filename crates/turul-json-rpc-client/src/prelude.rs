//! # JSON-RPC Client Prelude
//!
//! ```rust
//! use turul_json_rpc_client::prelude::*;
//! ```

// Core client types
pub use crate::client::Client;
pub use crate::config::{BatchConfig, ClientConfig, TimeoutConfig};
pub use crate::error::{ClientError, ClientResult};

// Transport types
pub use crate::transport::{
    HttpTransport, LocalTransport, SharedTransport, Transport, TransportType,
};

// Message model
pub use turul_json_rpc_server::{
    Cardinality, JsonRpcErrorObject, JsonRpcRequest, JsonRpcResponse, RequestId,
};

pub use std::time::Duration;
