//! In-process transport handing payloads straight to a dispatcher

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use turul_json_rpc_server::JsonRpcDispatcher;

use crate::transport::{Transport, TransportStatistics, TransportType};

/// Transport that never leaves the process.
///
/// Useful for embedding a server next to its client and for tests that
/// want the real dispatch path without sockets.
#[derive(Clone)]
pub struct LocalTransport {
    dispatcher: Arc<JsonRpcDispatcher>,
    requests_sent: Arc<AtomicU64>,
    responses_received: Arc<AtomicU64>,
}

impl LocalTransport {
    pub fn new(dispatcher: Arc<JsonRpcDispatcher>) -> Self {
        Self {
            dispatcher,
            requests_sent: Arc::new(AtomicU64::new(0)),
            responses_received: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The dispatcher payloads are handed to
    pub fn dispatcher(&self) -> &Arc<JsonRpcDispatcher> {
        &self.dispatcher
    }
}

impl From<JsonRpcDispatcher> for LocalTransport {
    fn from(dispatcher: JsonRpcDispatcher) -> Self {
        Self::new(Arc::new(dispatcher))
    }
}

#[async_trait]
impl Transport for LocalTransport {
    fn transport_type(&self) -> TransportType {
        TransportType::Local
    }

    async fn execute(&self, request: Vec<u8>) -> Vec<u8> {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
        let reply = self.dispatcher.handle(&request).await;
        trace!(sent = request.len(), received = reply.len(), "Local exchange");
        if !reply.is_empty() {
            self.responses_received.fetch_add(1, Ordering::Relaxed);
        }
        reply
    }

    fn statistics(&self) -> TransportStatistics {
        TransportStatistics {
            requests_sent: self.requests_sent.load(Ordering::Relaxed),
            responses_received: self.responses_received.load(Ordering::Relaxed),
            errors: 0,
            last_error: None,
        }
    }
}
