//! # JSON-RPC 2.0 Client
//!
//! An async JSON-RPC 2.0 client over a pluggable transport, with optional
//! request coalescing: calls issued within a short window from any number
//! of tasks are sent as one batch, and each caller gets back the response
//! matching its own request id.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use turul_json_rpc_client::{Client, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::batched(Duration::from_millis(10));
//!     let client = Client::http_with_config("http://127.0.0.1:8000/rpc", config)?;
//!
//!     let sum: f64 = client.call("add", &(2.0, 3.0)).await?;
//!     client.notify("log", "done").await?;
//!     println!("sum = {}", sum);
//!     Ok(())
//! }
//! ```
//!
//! ## Transports
//!
//! - [`transport::HttpTransport`]: one HTTP POST per payload
//! - [`transport::LocalTransport`]: hands payloads to an in-process
//!   [`turul_json_rpc_server::JsonRpcDispatcher`]
//!
//! Transports never return errors. A failed exchange comes back as an
//! encoded error response (`-32600`, `-32000` or `-32603`) and reaches the
//! caller as [`ClientError::Rpc`].

pub mod client;
pub mod config;
pub mod error;
pub mod prelude;
pub mod transport;

// Re-export main types
pub use client::Client;
pub use config::{BatchConfig, ClientConfig, ConnectionConfig, TimeoutConfig};
pub use error::{ClientError, ClientResult};

// Re-export transport types
pub use transport::{SharedTransport, Transport, TransportStatistics, TransportType};

// Re-export the message model for convenience
pub use turul_json_rpc_server::{
    Cardinality, JsonRpcErrorObject, JsonRpcRequest, JsonRpcResponse, RequestId, error_codes,
};
