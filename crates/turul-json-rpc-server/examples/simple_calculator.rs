//! Simple Calculator JSON-RPC Example
//!
//! Registers a few typed handlers and feeds raw payloads (single, batch,
//! notification and malformed) straight into the dispatcher.

use serde::Deserialize;
use turul_json_rpc_server::{BoxError, JsonRpcDispatcher, JsonRpcErrorObject};

#[derive(Deserialize)]
struct DivideParams {
    dividend: f64,
    divisor: f64,
}

#[tokio::main]
async fn main() {
    println!("Simple Calculator JSON-RPC Example");
    println!("==================================");

    let mut dispatcher = JsonRpcDispatcher::new();
    dispatcher.handle_func("add", |(a, b): (f64, f64)| async move {
        Ok::<_, BoxError>(a + b)
    });
    dispatcher.handle_func("subtract", |(a, b): (f64, f64)| async move {
        Ok::<_, BoxError>(a - b)
    });
    dispatcher.handle_func("divide", |p: DivideParams| async move {
        if p.divisor == 0.0 {
            return Err(JsonRpcErrorObject::application(1001, "Division by zero", None).into());
        }
        Ok::<_, BoxError>(p.dividend / p.divisor)
    });
    dispatcher.handle_func_without_params("log", || async {
        println!("  (log notification received)");
        Ok::<_, BoxError>(())
    });

    let test_requests = [
        r#"{"jsonrpc": "2.0", "method": "add", "params": [5, 3], "id": 1}"#,
        r#"{"jsonrpc": "2.0", "method": "divide", "params": {"dividend": 1, "divisor": 0}, "id": 2}"#,
        r#"{"jsonrpc": "2.0", "method": "multiply", "params": [2, 3], "id": 3}"#,
        r#"{"jsonrpc": "2.0", "method": "add", "params": ["invalid", 5], "id": 4}"#,
        r#"[{"jsonrpc": "2.0", "method": "subtract", "params": [10, 4], "id": 5}, {"jsonrpc": "2.0", "method": "log"}]"#,
        r#"{"jsonrpc": "2.0", "method": "log"}"#,
        r#"{"jsonrpc": "2.0", "method"#,
    ];

    for (i, request_json) in test_requests.iter().enumerate() {
        println!("\n--- Test {} ---", i + 1);
        println!("Request:  {}", request_json);

        let output = dispatcher.handle(request_json.as_bytes()).await;
        if output.is_empty() {
            println!("Response: <nothing written>");
        } else {
            println!("Response: {}", String::from_utf8_lossy(&output));
        }
    }
}
