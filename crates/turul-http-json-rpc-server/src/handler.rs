//! HTTP request handler for JSON-RPC payloads

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use tracing::{debug, error, warn};

use turul_json_rpc_server::{BoxError, JsonRpcDispatcher};

use crate::ServerConfig;

/// HTTP handler for JSON-RPC requests
#[derive(Clone)]
pub struct JsonRpcHttpHandler {
    config: Arc<ServerConfig>,
    dispatcher: Arc<JsonRpcDispatcher>,
}

impl JsonRpcHttpHandler {
    pub fn new(config: Arc<ServerConfig>, dispatcher: Arc<JsonRpcDispatcher>) -> Self {
        Self { config, dispatcher }
    }

    pub fn dispatcher(&self) -> &Arc<JsonRpcDispatcher> {
        &self.dispatcher
    }

    /// Route one HTTP request.
    ///
    /// Only `POST` on the RPC path reaches the dispatcher. Other methods on
    /// that path get an empty `200 OK`; other paths get `404`.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let path = req.uri().path();
        if path != self.config.rpc_path {
            debug!("No route for {} {}", req.method(), path);
            return plain(StatusCode::NOT_FOUND, "Not Found");
        }

        if req.method() != Method::POST {
            debug!(method = %req.method(), "Ignoring non-POST request");
            return plain(StatusCode::OK, "");
        }

        self.handle_json_rpc_request(req).await
    }

    async fn handle_json_rpc_request<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let body = Limited::new(req.into_body(), self.config.max_body_size);
        let payload = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                warn!(limit = self.config.max_body_size, "Request body too large");
                return plain(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
            }
            Err(err) => {
                error!("Failed to read request body: {}", err);
                return plain(StatusCode::INTERNAL_SERVER_ERROR, "Server error");
            }
        };

        debug!(bytes = payload.len(), "Received JSON-RPC payload");
        let output = self.dispatcher.handle(&payload).await;

        let mut response = Response::new(Full::new(Bytes::from(output)));
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

fn plain(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::body::Frame;
    use serde_json::{Value, json};
    use std::pin::Pin;
    use std::task::{Context, Poll};

    fn handler(max_body_size: usize) -> JsonRpcHttpHandler {
        let mut dispatcher = JsonRpcDispatcher::new();
        dispatcher.handle_func("echo", |value: Value| async move { Ok::<_, BoxError>(value) });
        let config = ServerConfig {
            max_body_size,
            ..ServerConfig::default()
        };
        JsonRpcHttpHandler::new(Arc::new(config), Arc::new(dispatcher))
    }

    fn post(path: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn body_of(response: Response<Full<Bytes>>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    /// A body whose first frame is a read error
    struct Broken;

    impl Body for Broken {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, std::io::Error>>> {
            Poll::Ready(Some(Err(std::io::Error::other("connection reset"))))
        }
    }

    #[tokio::test]
    async fn test_post_dispatches() {
        let response = handler(1024)
            .handle(post("/rpc", r#"{"jsonrpc":"2.0","id":1,"method":"echo","params":"hi"}"#))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body: Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body, json!({"jsonrpc": "2.0", "id": 1, "result": "hi"}));
    }

    #[tokio::test]
    async fn test_notification_gets_empty_body() {
        let response = handler(1024)
            .handle(post("/rpc", r#"{"jsonrpc":"2.0","method":"echo","params":1}"#))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_non_post_is_ignored() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/rpc")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = handler(1024).handle(request).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_of(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let response = handler(1024).handle(post("/other", "{}")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let payload = format!(
            r#"{{"jsonrpc":"2.0","id":1,"method":"echo","params":"{}"}}"#,
            "x".repeat(256)
        );
        let response = handler(64).handle(post("/rpc", &payload)).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_body_read_failure() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/rpc")
            .body(Broken)
            .unwrap();
        let response = handler(1024).handle(request).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, "Server error");
    }

    #[tokio::test]
    async fn test_parse_error_is_still_200() {
        let response = handler(1024).handle(post("/rpc", "{oops")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&body_of(response).await).unwrap();
        assert_eq!(body["error"]["code"], -32700);
        assert_eq!(body["id"], Value::Null);
    }
}
