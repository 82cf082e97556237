//! Dispatch engine: parse → validate → resolve → decode params → invoke → encode.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::error::JsonRpcErrorObject;
use crate::handler::{FunctionHandler, HandlerResult, MethodHandler, NoParamsHandler};
use crate::request::JsonRpcRequest;
use crate::response::JsonRpcResponse;
use crate::types::Cardinality;

/// JSON-RPC method registry and dispatcher.
///
/// Register handlers first, then share it (usually behind an `Arc`) with
/// whatever serves requests. Registration during live serving is not
/// supported.
#[derive(Default)]
pub struct JsonRpcDispatcher {
    handlers: HashMap<String, Arc<dyn MethodHandler>>,
}

impl JsonRpcDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a method. Registering the same name again
    /// replaces the previous handler.
    pub fn register_method<H>(&mut self, method: impl Into<String>, handler: H)
    where
        H: MethodHandler + 'static,
    {
        let method = method.into();
        if self.handlers.insert(method.clone(), Arc::new(handler)).is_some() {
            debug!(method = %method, "Replaced existing handler");
        }
    }

    /// Register an async function whose params decode into `P`
    pub fn handle_func<P, R, F, Fut>(&mut self, method: impl Into<String>, function: F)
    where
        P: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<R>> + Send + 'static,
    {
        self.register_method(method, FunctionHandler::new(function));
    }

    /// Register an async function that takes no params
    pub fn handle_func_without_params<R, F, Fut>(&mut self, method: impl Into<String>, function: F)
    where
        R: Serialize + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult<R>> + Send + 'static,
    {
        self.register_method(method, NoParamsHandler::new(function));
    }

    /// Get all registered methods
    pub fn registered_methods(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    /// Declared (param, result) type names of a registered method
    pub fn handler_signature(
        &self,
        method: &str,
    ) -> Option<(Option<&'static str>, Option<&'static str>)> {
        self.handlers
            .get(method)
            .map(|handler| (handler.param_type(), handler.result_type()))
    }

    /// Process one request.
    ///
    /// Returns `None` for notifications, whatever the handler outcome. A
    /// request with the wrong protocol version always gets a response.
    pub async fn call(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if !request.version.is_supported() {
            debug!(
                version = %request.version,
                method = %request.method,
                "Rejecting unsupported JSON-RPC version"
            );
            return Some(JsonRpcResponse::error(
                request.id,
                JsonRpcErrorObject::invalid_request(Some(Value::String(
                    "Invalid JSON-RPC version".to_string(),
                ))),
            ));
        }

        let outcome = match self.handlers.get(&request.method) {
            Some(handler) => {
                debug!(method = %request.method, id = ?request.id, "Dispatching request");
                handler.handle(request.params.as_deref()).await
            }
            None => Err(JsonRpcErrorObject::method_not_found(&request.method)),
        };

        let Some(id) = request.id else {
            if let Err(err) = outcome {
                debug!(
                    method = %request.method,
                    code = err.code,
                    "Notification failed, no response sent"
                );
            }
            return None;
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(Some(id), result),
            Err(err) => JsonRpcResponse::error(Some(id), err),
        })
    }

    /// Parse a raw payload into a single request or a batch
    pub fn parse(payload: &[u8]) -> Result<Cardinality<JsonRpcRequest>, JsonRpcErrorObject> {
        if payload.iter().all(u8::is_ascii_whitespace) {
            return Err(JsonRpcErrorObject::parse_error(Some(Value::String(
                "Empty request".to_string(),
            ))));
        }

        if Cardinality::<JsonRpcRequest>::is_batch_payload(payload) {
            let requests: Vec<JsonRpcRequest> =
                serde_json::from_slice(payload).map_err(|err| decode_failure(payload, err))?;
            if requests.is_empty() {
                return Err(JsonRpcErrorObject::invalid_request(Some(Value::String(
                    "Empty request".to_string(),
                ))));
            }
            Ok(Cardinality::Batch(requests))
        } else {
            serde_json::from_slice(payload)
                .map(Cardinality::Single)
                .map_err(|err| decode_failure(payload, err))
        }
    }

    /// Byte-in/byte-out entry point.
    ///
    /// Returns an empty vector when nothing must be written back (a single
    /// notification or an all-notification batch).
    pub async fn handle(&self, payload: &[u8]) -> Vec<u8> {
        let encoded = match Self::parse(payload) {
            Err(err) => {
                debug!(code = err.code, "Rejecting unparseable payload");
                serde_json::to_vec(&JsonRpcResponse::error(None, err))
            }
            Ok(Cardinality::Single(request)) => match self.call(request).await {
                Some(response) => serde_json::to_vec(&response),
                None => return Vec::new(),
            },
            Ok(Cardinality::Batch(requests)) => {
                debug!(size = requests.len(), "Dispatching batch");
                let responses: Vec<JsonRpcResponse> =
                    join_all(requests.into_iter().map(|request| self.call(request)))
                        .await
                        .into_iter()
                        .flatten()
                        .collect();
                if responses.is_empty() {
                    return Vec::new();
                }
                serde_json::to_vec(&responses)
            }
        };

        encoded.unwrap_or_else(|err| {
            error!("Failed to encode response: {}", err);
            let fallback = JsonRpcResponse::error(
                None,
                JsonRpcErrorObject::internal_error(Some(Value::String(err.to_string()))),
            );
            serde_json::to_vec(&fallback).unwrap_or_default()
        })
    }
}

/// Valid JSON of the wrong shape is an invalid request, anything else a parse error
fn decode_failure(payload: &[u8], err: serde_json::Error) -> JsonRpcErrorObject {
    let data = Some(Value::String(err.to_string()));
    if serde_json::from_slice::<IgnoredAny>(payload).is_ok() {
        warn!("Payload is JSON but not a JSON-RPC request: {}", err);
        JsonRpcErrorObject::invalid_request(data)
    } else {
        JsonRpcErrorObject::parse_error(data)
    }
}
