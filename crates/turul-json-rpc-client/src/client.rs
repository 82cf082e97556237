//! JSON-RPC client with request coalescing
//!
//! Calls issued with a non-zero window are collected into one pending batch.
//! The first call to join an empty batch starts a window task; when the
//! window elapses the task sends everything collected so far as one
//! wire-level batch and hands each response to the caller waiting on its id.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, oneshot};
use tracing::{debug, warn};

use turul_json_rpc_server::{
    Cardinality, JsonRpcDispatcher, JsonRpcErrorObject, JsonRpcRequest, JsonRpcResponse, RequestId,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::transport::{HttpTransport, LocalTransport, SharedTransport};

/// JSON-RPC client.
///
/// Cheap to clone; clones share the transport, the id counter and the
/// pending batch.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: SharedTransport,
    config: ClientConfig,
    next_id: AtomicI64,
    batch: Mutex<BatchState>,
}

/// Requests waiting for the window task, guarded by the batch gate
#[derive(Default)]
struct BatchState {
    pending: Vec<JsonRpcRequest>,
    waiters: HashMap<i64, oneshot::Sender<JsonRpcResponse>>,
    running: bool,
}

/// Holds the gate for one flush and leaves the state empty however the
/// flush ends.
struct FlushGuard<'a> {
    state: MutexGuard<'a, BatchState>,
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.state.pending.clear();
        self.state.running = false;
    }
}

impl Client {
    /// Create a client with default configuration (no batching)
    pub fn new(transport: SharedTransport) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    pub fn with_config(transport: SharedTransport, config: ClientConfig) -> Self {
        debug!(
            transport = %transport.transport_type(),
            window = ?config.batch.window,
            "Creating JSON-RPC client"
        );
        Self {
            inner: Arc::new(ClientInner {
                transport,
                config,
                next_id: AtomicI64::new(1),
                batch: Mutex::new(BatchState::default()),
            }),
        }
    }

    /// Client talking HTTP to `endpoint`
    pub fn http(endpoint: &str) -> ClientResult<Self> {
        Self::http_with_config(endpoint, ClientConfig::default())
    }

    pub fn http_with_config(endpoint: &str, config: ClientConfig) -> ClientResult<Self> {
        let transport = HttpTransport::with_config(endpoint, &config)?;
        Ok(Self::with_config(Arc::new(transport), config))
    }

    /// Client bound to a dispatcher in the same process
    pub fn local(dispatcher: Arc<JsonRpcDispatcher>) -> Self {
        Self::new(Arc::new(LocalTransport::new(dispatcher)))
    }

    pub fn transport(&self) -> &SharedTransport {
        &self.inner.transport
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Send one request or a batch as-is and decode the reply with the same
    /// cardinality. Never fails: any fault comes back as error responses.
    pub async fn raw_request(
        &self,
        request: Cardinality<JsonRpcRequest>,
    ) -> Cardinality<JsonRpcResponse> {
        self.inner.raw_request(request).await
    }

    /// Issue a call (`response` is `Some`) or a notification (`None`).
    ///
    /// A zero `timeout` sends the request on its own. A non-zero one adds it
    /// to the pending batch, which is flushed `timeout` after the first
    /// request joined it. On success the decoded result is written into
    /// `response`; on a protocol error `response` is left untouched.
    pub async fn request<P, R>(
        &self,
        method: &str,
        params: &P,
        response: Option<&mut R>,
        timeout: Duration,
    ) -> ClientResult<()>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let id = response.is_some().then(|| self.next_id());
        let request = JsonRpcRequest::with_params(id, method, params).map_err(ClientError::Encode)?;

        let Some(reply) = self.submit(request, timeout).await else {
            return Ok(());
        };

        if let Some(error) = reply.error {
            return Err(ClientError::Rpc(error));
        }
        if let Some(target) = response {
            *target = reply.result_as().map_err(ClientError::Decode)?;
        }
        Ok(())
    }

    /// Call `method` using the configured batch window
    pub async fn call<P, R>(&self, method: &str, params: &P) -> ClientResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.call_with_timeout(method, params, self.inner.config.batch.window)
            .await
    }

    pub async fn call_with_timeout<P, R>(
        &self,
        method: &str,
        params: &P,
        timeout: Duration,
    ) -> ClientResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = JsonRpcRequest::with_params(Some(self.next_id()), method, params)
            .map_err(ClientError::Encode)?;

        match self.submit(request, timeout).await {
            Some(reply) => decode_result(reply),
            // Calls always get a reply, synthesized if need be
            None => Err(ClientError::Rpc(JsonRpcErrorObject::internal_error(None))),
        }
    }

    /// Send a notification using the configured batch window
    pub async fn notify<P>(&self, method: &str, params: &P) -> ClientResult<()>
    where
        P: Serialize + ?Sized,
    {
        self.request::<P, Value>(method, params, None, self.inner.config.batch.window)
            .await
    }

    fn next_id(&self) -> RequestId {
        RequestId::Number(self.inner.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn submit(&self, request: JsonRpcRequest, timeout: Duration) -> Option<JsonRpcResponse> {
        if timeout.is_zero() {
            if request.is_notification() {
                return self.inner.notify_now(request).await;
            }
            return self
                .inner
                .raw_request(Cardinality::Single(request))
                .await
                .into_vec()
                .pop();
        }
        self.enqueue(request, timeout).await
    }

    /// Add `request` to the pending batch and wait for its response.
    /// Notifications return as soon as they are queued.
    async fn enqueue(&self, request: JsonRpcRequest, window: Duration) -> Option<JsonRpcResponse> {
        let id = request.id.as_ref().and_then(RequestId::as_i64);

        let receiver = {
            let mut state = self.inner.batch.lock().await;

            let receiver = id.map(|id| {
                let (sender, receiver) = oneshot::channel();
                state.waiters.insert(id, sender);
                receiver
            });
            state.pending.push(request);

            if !state.running {
                state.running = true;
                debug!(window = ?window, "Opening batch window");
                tokio::spawn(Arc::clone(&self.inner).flush_after(window));
            }
            receiver
        };

        let receiver = receiver?;
        match receiver.await {
            Ok(response) => Some(response),
            Err(_) => {
                warn!(id = ?id, "Batch ended without delivering a response");
                Some(JsonRpcResponse::error(
                    id.map(RequestId::Number),
                    JsonRpcErrorObject::internal_error(Some(Value::String(
                        "Batch dropped".to_string(),
                    ))),
                ))
            }
        }
    }
}

impl ClientInner {
    async fn raw_request(
        &self,
        request: Cardinality<JsonRpcRequest>,
    ) -> Cardinality<JsonRpcResponse> {
        let payload = match serde_json::to_vec(&request) {
            Ok(payload) => payload,
            Err(e) => return synthesize(&request, internal_error(e.to_string())),
        };

        let reply = self.transport.execute(payload).await;

        match &request {
            Cardinality::Single(_) => match serde_json::from_slice::<JsonRpcResponse>(&reply) {
                Ok(response) => Cardinality::Single(response),
                Err(e) => {
                    warn!("Undecodable reply: {}", e);
                    synthesize(&request, internal_error(e.to_string()))
                }
            },
            Cardinality::Batch(requests) => {
                if reply.is_empty() && requests.iter().all(JsonRpcRequest::is_notification) {
                    return Cardinality::Batch(Vec::new());
                }
                match serde_json::from_slice::<Vec<JsonRpcResponse>>(&reply) {
                    Ok(responses) => Cardinality::Batch(responses),
                    Err(e) => {
                        warn!("Undecodable batch reply: {}", e);
                        // A single error object in place of the array rides along as data
                        let data = match serde_json::from_slice::<JsonRpcResponse>(&reply) {
                            Ok(JsonRpcResponse {
                                error: Some(error), ..
                            }) => serde_json::to_value(&error)
                                .unwrap_or_else(|_| Value::String(e.to_string())),
                            _ => Value::String(e.to_string()),
                        };
                        synthesize(&request, JsonRpcErrorObject::internal_error(Some(data)))
                    }
                }
            }
        }
    }

    /// Immediate notification: an empty reply is success, an error reply
    /// is surfaced.
    async fn notify_now(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let payload = match serde_json::to_vec(&request) {
            Ok(payload) => payload,
            Err(e) => return Some(JsonRpcResponse::error(None, internal_error(e.to_string()))),
        };

        let reply = self.transport.execute(payload).await;
        if reply.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        match serde_json::from_slice::<JsonRpcResponse>(&reply) {
            Ok(response) => Some(response),
            Err(e) => {
                debug!(method = %request.method, "Ignoring undecodable notification reply: {}", e);
                None
            }
        }
    }

    /// Window task body
    async fn flush_after(self: Arc<Self>, window: Duration) {
        tokio::time::sleep(window).await;

        let mut flush = FlushGuard {
            state: self.batch.lock().await,
        };
        let pending = std::mem::take(&mut flush.state.pending);
        let mut waiters = std::mem::take(&mut flush.state.waiters);

        debug!(size = pending.len(), waiting = waiters.len(), "Flushing batch");
        let responses = self.raw_request(Cardinality::Batch(pending)).await.into_vec();

        for response in responses {
            let Some(id) = response.numeric_id() else {
                debug!("Dropping batch response without id");
                continue;
            };
            match waiters.remove(&id) {
                // The caller may have gone away
                Some(waiter) => {
                    let _ = waiter.send(response);
                }
                None => debug!(id, "Dropping response for unknown id"),
            }
        }

        for (id, waiter) in waiters {
            warn!(id, "No response in batch, synthesizing internal error");
            let _ = waiter.send(JsonRpcResponse::error(
                Some(RequestId::Number(id)),
                internal_error(format!("No response for request {}", id)),
            ));
        }

        drop(flush);
    }
}

fn internal_error(detail: String) -> JsonRpcErrorObject {
    JsonRpcErrorObject::internal_error(Some(Value::String(detail)))
}

/// One error response per id-carrying request. A single request always
/// gets one, echoing its id.
fn synthesize(
    request: &Cardinality<JsonRpcRequest>,
    error: JsonRpcErrorObject,
) -> Cardinality<JsonRpcResponse> {
    match request {
        Cardinality::Single(request) => {
            Cardinality::Single(JsonRpcResponse::error(request.id.clone(), error))
        }
        Cardinality::Batch(requests) => Cardinality::Batch(
            requests
                .iter()
                .filter_map(|request| request.id.clone())
                .map(|id| JsonRpcResponse::error(Some(id), error.clone()))
                .collect(),
        ),
    }
}

fn decode_result<R: DeserializeOwned>(reply: JsonRpcResponse) -> ClientResult<R> {
    if let Some(error) = reply.error {
        return Err(ClientError::Rpc(error));
    }
    reply.result_as().map_err(ClientError::Decode)
}
