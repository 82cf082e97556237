//! Calculator over HTTP
//!
//! ```text
//! cargo run -p turul-http-json-rpc-server --example calculator_server
//! curl -s localhost:8000/rpc -d '{"jsonrpc":"2.0","id":1,"method":"add","params":[2,3]}'
//! ```

use serde::Deserialize;
use tracing::info;
use turul_http_json_rpc_server::{BoxError, HttpJsonRpcServer, JsonRpcErrorObject};

#[derive(Deserialize)]
struct DivideParams {
    dividend: f64,
    divisor: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,turul_http_json_rpc_server=debug".into()),
        )
        .init();

    let server = HttpJsonRpcServer::builder()
        .handle_func("add", |(a, b): (f64, f64)| async move { Ok::<_, BoxError>(a + b) })
        .handle_func("divide", |p: DivideParams| async move {
            if p.divisor == 0.0 {
                return Err(JsonRpcErrorObject::application(1001, "Division by zero", None).into());
            }
            Ok::<_, BoxError>(p.dividend / p.divisor)
        })
        .handle_func("log", |message: String| async move {
            info!("client says: {}", message);
            Ok::<_, BoxError>(())
        })
        .build();

    server.run().await?;
    Ok(())
}
