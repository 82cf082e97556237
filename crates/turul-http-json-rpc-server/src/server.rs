//! HTTP JSON-RPC server
//!
//! Accept loop over a tokio listener. Each connection is served by hyper's
//! HTTP/1 implementation on its own task, sharing one dispatcher.

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use turul_json_rpc_server::{HandlerResult, JsonRpcDispatcher, MethodHandler};

use crate::{JsonRpcHttpHandler, Result};

/// Configuration for the HTTP JSON-RPC server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_address: SocketAddr,
    /// Path for the JSON-RPC endpoint
    pub rpc_path: String,
    /// Maximum request body size
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8000)),
            rpc_path: "/rpc".to_string(),
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Builder for the HTTP JSON-RPC server
#[derive(Default)]
pub struct HttpJsonRpcServerBuilder {
    config: ServerConfig,
    dispatcher: JsonRpcDispatcher,
}

impl HttpJsonRpcServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already populated dispatcher
    pub fn with_dispatcher(dispatcher: JsonRpcDispatcher) -> Self {
        Self {
            config: ServerConfig::default(),
            dispatcher,
        }
    }

    /// Set the bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.config.bind_address = addr;
        self
    }

    /// Set the JSON-RPC endpoint path
    pub fn rpc_path(mut self, path: impl Into<String>) -> Self {
        self.config.rpc_path = path.into();
        self
    }

    /// Set maximum request body size
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Register a typed handler for `method`
    pub fn handle_func<P, R, F, Fut>(mut self, method: impl Into<String>, function: F) -> Self
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<R>> + Send + 'static,
    {
        self.dispatcher.handle_func(method, function);
        self
    }

    /// Register a handler that takes no parameters
    pub fn handle_func_without_params<R, F, Fut>(
        mut self,
        method: impl Into<String>,
        function: F,
    ) -> Self
    where
        R: Serialize + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<R>> + Send + 'static,
    {
        self.dispatcher.handle_func_without_params(method, function);
        self
    }

    /// Register a hand-written handler
    pub fn register_method<H>(mut self, method: impl Into<String>, handler: H) -> Self
    where
        H: MethodHandler + 'static,
    {
        self.dispatcher.register_method(method, handler);
        self
    }

    /// Build the HTTP JSON-RPC server
    pub fn build(self) -> HttpJsonRpcServer {
        let config = Arc::new(self.config);
        let dispatcher = Arc::new(self.dispatcher);
        HttpJsonRpcServer {
            handler: JsonRpcHttpHandler::new(Arc::clone(&config), dispatcher),
            config,
        }
    }
}

/// HTTP JSON-RPC server
#[derive(Clone)]
pub struct HttpJsonRpcServer {
    config: Arc<ServerConfig>,
    handler: JsonRpcHttpHandler,
}

impl HttpJsonRpcServer {
    pub fn builder() -> HttpJsonRpcServerBuilder {
        HttpJsonRpcServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Arc<JsonRpcDispatcher> {
        self.handler.dispatcher()
    }

    /// Bind the configured address and serve until the listener fails
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_address).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!("HTTP JSON-RPC server listening on {}", local_addr);
        info!("JSON-RPC endpoint available at: {}", self.config.rpc_path);
        debug!(methods = ?self.dispatcher().registered_methods(), "Registered methods");

        loop {
            let (stream, peer_addr) = listener.accept().await?;
            debug!("New connection from {}", peer_addr);

            let handler = self.handler.clone();
            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let handler = handler.clone();
                    async move { Ok::<_, Infallible>(handler.handle(req).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    if err.is_incomplete_message() {
                        debug!("Client disconnected: {}", err);
                    } else {
                        error!("Error serving connection: {}", err);
                    }
                }
            });
        }
    }
}
