//! HTTP transport implementation for the JSON-RPC client

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::de::IgnoredAny;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use turul_json_rpc_server::JsonRpcErrorObject;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::transport::{Transport, TransportStatistics, TransportType, synthesize_error};

/// Where an exchange went wrong. Each fault maps to its own error code.
#[derive(Debug, Error)]
enum TransportFault {
    /// The outbound payload is not JSON, nothing was sent
    #[error("invalid outbound payload: {0}")]
    InvalidRequest(String),

    /// No reply bytes at all
    #[error("HTTP exchange failed: {0}")]
    Network(String),

    /// Reply bytes that are not JSON
    #[error("invalid reply: {0}")]
    InvalidResponse(String),
}

impl TransportFault {
    fn into_error_object(self) -> JsonRpcErrorObject {
        let data = Some(Value::String(self.to_string()));
        match self {
            TransportFault::InvalidRequest(_) => JsonRpcErrorObject::invalid_request(data),
            TransportFault::Network(_) => JsonRpcErrorObject::server_error(data),
            TransportFault::InvalidResponse(_) => JsonRpcErrorObject::internal_error(data),
        }
    }
}

/// HTTP transport: one POST per payload, `Content-Type: application/json`
#[derive(Debug)]
pub struct HttpTransport {
    /// HTTP client
    client: Client,
    /// Server endpoint URL
    endpoint: Url,
    /// Statistics
    stats: Arc<parking_lot::Mutex<TransportStatistics>>,
}

impl HttpTransport {
    /// Create a new HTTP transport with default configuration
    pub fn new(endpoint: &str) -> ClientResult<Self> {
        Self::with_config(endpoint, &ClientConfig::default())
    }

    /// Create a new HTTP transport from client configuration
    pub fn with_config(endpoint: &str, config: &ClientConfig) -> ClientResult<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeouts.request)
            .connect_timeout(config.timeouts.connect);

        if let Some(user_agent) = &config.connection.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        if let Some(headers) = &config.connection.headers {
            let mut header_map = HeaderMap::new();
            for (name, value) in headers {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| {
                        ClientError::config(format!("Invalid header name {}: {}", name, e))
                    })?;
                let value = HeaderValue::from_str(value)
                    .map_err(|e| ClientError::config(format!("Invalid header value: {}", e)))?;
                header_map.insert(name, value);
            }
            builder = builder.default_headers(header_map);
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::config(format!("Failed to create HTTP client: {}", e)))?;

        Self::with_client(endpoint, client)
    }

    /// Create HTTP transport with custom client
    pub fn with_client(endpoint: &str, client: Client) -> ClientResult<Self> {
        let url = Url::parse(endpoint)
            .map_err(|e| ClientError::config(format!("Invalid URL: {}", e)))?;

        // Validate URL scheme
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::config(format!(
                "Invalid scheme for HTTP transport: {}",
                url.scheme()
            )));
        }

        Ok(Self {
            client,
            endpoint: url,
            stats: Arc::new(parking_lot::Mutex::new(TransportStatistics::default())),
        })
    }

    /// Server endpoint URL
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Update statistics
    fn update_stats<F>(&self, update_fn: F)
    where
        F: FnOnce(&mut TransportStatistics),
    {
        let mut stats = self.stats.lock();
        update_fn(&mut stats);
    }

    async fn exchange(&self, request: Vec<u8>) -> Result<Vec<u8>, TransportFault> {
        if let Err(e) = serde_json::from_slice::<IgnoredAny>(&request) {
            return Err(TransportFault::InvalidRequest(e.to_string()));
        }

        debug!(endpoint = %self.endpoint, bytes = request.len(), "Sending JSON-RPC payload");
        self.update_stats(|stats| stats.requests_sent += 1);

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(request)
            .send()
            .await
            .map_err(|e| TransportFault::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportFault::Network(e.to_string()))?;

        // All-notification payloads legitimately get an empty body
        if body.iter().all(u8::is_ascii_whitespace) {
            debug!(status = %status, "Empty reply");
            return Ok(Vec::new());
        }

        if serde_json::from_slice::<IgnoredAny>(&body).is_err() {
            return Err(TransportFault::InvalidResponse(format!(
                "HTTP {}: {}",
                status,
                String::from_utf8_lossy(&body)
            )));
        }

        self.update_stats(|stats| stats.responses_received += 1);
        Ok(body.to_vec())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn transport_type(&self) -> TransportType {
        TransportType::Http
    }

    async fn execute(&self, request: Vec<u8>) -> Vec<u8> {
        match self.exchange(request).await {
            Ok(reply) => reply,
            Err(fault) => {
                warn!(endpoint = %self.endpoint, error = %fault, "Synthesizing error response");
                self.update_stats(|stats| {
                    stats.errors += 1;
                    stats.last_error = Some(fault.to_string());
                });
                synthesize_error(fault.into_error_object())
            }
        }
    }

    fn statistics(&self) -> TransportStatistics {
        self.stats.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use turul_json_rpc_server::{JsonRpcResponse, error_codes};

    /// One-shot HTTP stub answering the first request with `body`
    async fn stub_server(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();

            // Read the head, then exactly Content-Length bytes of body
            let mut received = Vec::new();
            let mut chunk = [0u8; 1024];
            let head_end = loop {
                let n = stream.read(&mut chunk).await.unwrap();
                received.extend_from_slice(&chunk[..n]);
                if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&received[..head_end]).to_ascii_lowercase();
            let length: usize = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .map(|value| value.trim().parse().unwrap())
                .unwrap_or(0);
            while received.len() < head_end + length {
                let n = stream.read(&mut chunk).await.unwrap();
                received.extend_from_slice(&chunk[..n]);
            }

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });
        format!("http://{}/rpc", addr)
    }

    fn error_code(reply: &[u8]) -> i32 {
        let response: JsonRpcResponse = serde_json::from_slice(reply).unwrap();
        response.error.unwrap().code
    }

    #[test]
    fn test_endpoint_validation() {
        assert!(HttpTransport::new("http://localhost:8080/rpc").is_ok());
        assert!(HttpTransport::new("https://example.com/rpc").is_ok());

        let err = HttpTransport::new("ws://localhost:8080/rpc").unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        assert!(HttpTransport::new("not a url").is_err());
    }

    #[test]
    fn test_invalid_header_is_config_error() {
        let mut config = ClientConfig::default();
        config.connection.headers = Some([("bad header".to_string(), "x".to_string())].into());

        let err = HttpTransport::with_config("http://localhost:8080/rpc", &config).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn test_malformed_payload_never_sent() {
        let transport = HttpTransport::new("http://127.0.0.1:9/rpc").unwrap();

        let reply = transport.execute(b"{not json".to_vec()).await;
        assert_eq!(error_code(&reply), error_codes::INVALID_REQUEST);

        let stats = transport.statistics();
        assert_eq!(stats.requests_sent, 0);
        assert_eq!(stats.errors, 1);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_server_error() {
        // Bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = HttpTransport::new(&format!("http://127.0.0.1:{}/rpc", port)).unwrap();
        let reply = transport
            .execute(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#.to_vec())
            .await;

        assert_eq!(error_code(&reply), error_codes::SERVER_ERROR);
        assert!(transport.statistics().last_error.is_some());
    }

    #[tokio::test]
    async fn test_non_json_reply_is_internal_error() {
        let endpoint = stub_server("<html>").await;
        let transport = HttpTransport::new(&endpoint).unwrap();

        let reply = transport
            .execute(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#.to_vec())
            .await;

        assert_eq!(error_code(&reply), error_codes::INTERNAL_ERROR);
        let stats = transport.statistics();
        assert_eq!(stats.requests_sent, 1);
        assert_eq!(stats.errors, 1);
    }

    #[tokio::test]
    async fn test_empty_reply_passes_through() {
        let endpoint = stub_server("").await;
        let transport = HttpTransport::new(&endpoint).unwrap();

        let reply = transport
            .execute(br#"{"jsonrpc":"2.0","method":"tick"}"#.to_vec())
            .await;

        assert!(reply.is_empty());
        assert_eq!(transport.statistics().errors, 0);
    }
}
