//! Batching client demo
//!
//! Fires a handful of concurrent calls at an in-process calculator. With a
//! 20ms window they all travel in one batch; set `RUST_LOG=debug` to watch
//! the window open and flush.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use turul_json_rpc_client::transport::LocalTransport;
use turul_json_rpc_client::{Client, ClientConfig, Transport};
use turul_json_rpc_server::{BoxError, JsonRpcDispatcher, JsonRpcErrorObject};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut dispatcher = JsonRpcDispatcher::new();
    dispatcher.handle_func("square", |n: i64| async move { Ok::<_, BoxError>(n * n) });
    dispatcher.handle_func("divide", |(a, b): (f64, f64)| async move {
        if b == 0.0 {
            return Err(JsonRpcErrorObject::application(1001, "Division by zero", None).into());
        }
        Ok::<_, BoxError>(a / b)
    });

    let transport = Arc::new(LocalTransport::new(Arc::new(dispatcher)));
    let client = Client::with_config(
        transport.clone(),
        ClientConfig::batched(Duration::from_millis(20)),
    );

    let squares: Vec<_> = (1..=5i64)
        .map(|n| {
            let client = client.clone();
            tokio::spawn(async move { (n, client.call::<_, i64>("square", &n).await) })
        })
        .collect();

    for handle in squares {
        match handle.await {
            Ok((n, Ok(square))) => info!("square({}) = {}", n, square),
            Ok((n, Err(e))) => info!("square({}) failed: {}", n, e),
            Err(e) => info!("task failed: {}", e),
        }
    }

    match client.call::<_, f64>("divide", &(1.0, 0.0)).await {
        Ok(quotient) => info!("divide = {}", quotient),
        Err(e) => info!("divide failed with code {:?}: {}", e.code(), e),
    }

    let stats = transport.statistics();
    info!(
        "{} payloads sent for 6 calls, {} replies",
        stats.requests_sent, stats.responses_received
    );
}
