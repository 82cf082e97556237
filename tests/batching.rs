//! Batching correlation tests
//!
//! Many callers share one client; a recording transport in front of a real
//! dispatcher shows what went over the wire.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

use turul_json_rpc_client::transport::LocalTransport;
use turul_json_rpc_client::{Client, ClientConfig, Transport, TransportType};
use turul_json_rpc_server::{BoxError, JsonRpcDispatcher, JsonRpcErrorObject};

/// Records outbound payloads, and can delay or reorder replies
struct RecordingTransport {
    local: LocalTransport,
    sent: parking_lot::Mutex<Vec<Value>>,
    reverse_batches: bool,
}

impl RecordingTransport {
    fn new(dispatcher: JsonRpcDispatcher, reverse_batches: bool) -> Arc<Self> {
        Arc::new(Self {
            local: dispatcher.into(),
            sent: parking_lot::Mutex::new(Vec::new()),
            reverse_batches,
        })
    }

    fn batch_sizes(&self) -> Vec<usize> {
        self.sent
            .lock()
            .iter()
            .map(|payload| payload.as_array().map_or(1, Vec::len))
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn transport_type(&self) -> TransportType {
        TransportType::Local
    }

    async fn execute(&self, request: Vec<u8>) -> Vec<u8> {
        self.sent.lock().push(serde_json::from_slice(&request).unwrap());
        let reply = self.local.execute(request).await;
        if !self.reverse_batches {
            return reply;
        }
        // Responses carry no ordering guarantee; only ids correlate
        match serde_json::from_slice::<Vec<Value>>(&reply) {
            Ok(mut responses) => {
                responses.reverse();
                serde_json::to_vec(&responses).unwrap()
            }
            Err(_) => reply,
        }
    }
}

fn dispatcher() -> JsonRpcDispatcher {
    let mut dispatcher = JsonRpcDispatcher::new();
    dispatcher.handle_func("identity", |n: i64| async move { Ok::<_, BoxError>(n) });
    dispatcher.handle_func("sleep_then_echo", |(n, millis): (i64, u64)| async move {
        tokio::time::sleep(Duration::from_millis(millis)).await;
        Ok::<_, BoxError>(n)
    });
    dispatcher.handle_func("fail_odd", |n: i64| async move {
        if n % 2 == 1 {
            return Err(JsonRpcErrorObject::application(-1, format!("odd {}", n), None).into());
        }
        Ok::<_, BoxError>(n)
    });
    dispatcher
}

#[tokio::test(start_paused = true)]
async fn test_two_calls_ten_millis_apart_share_a_batch() {
    let transport = RecordingTransport::new(dispatcher(), false);
    let client = Client::new(transport.clone());
    let window = Duration::from_millis(50);

    let early = {
        let client = client.clone();
        tokio::spawn(async move {
            client
                .call_with_timeout::<_, i64>("identity", &1, window)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    let late = client.call_with_timeout::<_, i64>("identity", &2, window).await;

    assert_eq!(early.await.unwrap().unwrap(), 1);
    assert_eq!(late.unwrap(), 2);
    assert_eq!(transport.batch_sizes(), vec![2]);
}

#[tokio::test(start_paused = true)]
async fn test_reordered_replies_still_correlate() {
    let transport = RecordingTransport::new(dispatcher(), true);
    let client = Client::with_config(
        transport.clone(),
        ClientConfig::batched(Duration::from_millis(10)),
    );

    let results = join_all((0..50i64).map(|n| {
        let client = client.clone();
        async move { (n, client.call::<_, i64>("identity", &n).await) }
    }))
    .await;

    for (n, result) in results {
        assert_eq!(result.unwrap(), n);
    }
    assert_eq!(transport.batch_sizes(), vec![50]);
}

#[tokio::test(start_paused = true)]
async fn test_mixed_outcomes_reach_the_right_callers() {
    let transport = RecordingTransport::new(dispatcher(), true);
    let client = Client::with_config(
        transport.clone(),
        ClientConfig::batched(Duration::from_millis(10)),
    );

    let results = join_all((0..10i64).map(|n| {
        let client = client.clone();
        async move { (n, client.call::<_, i64>("fail_odd", &n).await) }
    }))
    .await;

    for (n, result) in results {
        if n % 2 == 1 {
            let err = result.unwrap_err();
            assert_eq!(err.code(), Some(-1));
            assert_eq!(err.as_rpc().unwrap().message, format!("odd {}", n));
        } else {
            assert_eq!(result.unwrap(), n);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_calls_during_a_flush_form_the_next_batch() {
    let transport = RecordingTransport::new(dispatcher(), false);
    let client = Client::with_config(
        transport.clone(),
        ClientConfig::batched(Duration::from_millis(10)),
    );

    // First batch takes 100ms on the server side
    let slow = {
        let client = client.clone();
        tokio::spawn(async move { client.call::<_, i64>("sleep_then_echo", &(7, 100)).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let followers = join_all((0..3i64).map(|n| {
        let client = client.clone();
        async move { client.call::<_, i64>("identity", &n).await }
    }))
    .await;

    assert_eq!(slow.await.unwrap().unwrap(), 7);
    for (n, result) in followers.into_iter().enumerate() {
        assert_eq!(result.unwrap(), n as i64);
    }
    assert_eq!(transport.batch_sizes(), vec![1, 3]);
}

#[tokio::test(start_paused = true)]
async fn test_notifications_ride_along_without_waiting() {
    let transport = RecordingTransport::new(dispatcher(), false);
    let client = Client::with_config(
        transport.clone(),
        ClientConfig::batched(Duration::from_millis(25)),
    );

    for n in 0..3i64 {
        client.notify("identity", &n).await.unwrap();
    }
    assert!(transport.batch_sizes().is_empty());

    assert_eq!(client.call::<_, i64>("identity", &9).await.unwrap(), 9);
    assert_eq!(transport.batch_sizes(), vec![4]);
}

#[tokio::test(start_paused = true)]
async fn test_immediate_and_batched_calls_mix() {
    let transport = RecordingTransport::new(dispatcher(), false);
    let client = Client::with_config(
        transport.clone(),
        ClientConfig::batched(Duration::from_millis(25)),
    );

    let (batched, immediate) = tokio::join!(
        client.call::<_, i64>("identity", &1),
        client.call_with_timeout::<_, i64>("identity", &2, Duration::ZERO),
    );
    assert_eq!(batched.unwrap(), 1);
    assert_eq!(immediate.unwrap(), 2);

    // The immediate call goes out on its own before the window closes
    let sent = transport.sent.lock().clone();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].is_object());
    assert!(sent[1].is_array());
}
