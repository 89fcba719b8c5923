use super::{call_rpc, send, SwapFixture, RPC_PATH};
use axum::body::Body;
use axum::http::Request;
use serde_json::json;

#[tokio::test]
async fn test_rpc_batch_returns_one_reply_per_request_in_order() {
    let fixture = SwapFixture::new();
    let body = json!([
        { "jsonrpc": "2.0", "method": "initiate", "params": {}, "id": 1 },
        { "jsonrpc": "2.0", "method": "does.not.exist", "params": [], "id": 2 },
        { "not": "a request" }
    ]);

    let (status, value) = call_rpc(&fixture.router(), None, body).await;

    assert!(status.is_success());
    let replies = value.as_array().expect("array response");
    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0]["id"], 1);
    assert_eq!(replies[0]["error"]["code"], -32602);
    assert_eq!(replies[1]["error"]["code"], -32601);
    assert_eq!(replies[2]["error"]["code"], -32600);
}

#[tokio::test]
async fn test_rpc_when_batch_empty_then_invalid_request() {
    let fixture = SwapFixture::new();
    let (_, value) = call_rpc(&fixture.router(), None, json!([])).await;
    assert_eq!(value["error"]["code"], -32600);
}

#[tokio::test]
async fn test_rpc_when_body_not_json_then_parse_error() {
    let fixture = SwapFixture::new();
    let request = Request::builder()
        .method("POST")
        .uri(RPC_PATH)
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("request");

    let (status, bytes) = send(&fixture.router(), request).await;

    assert!(status.is_success());
    let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(value["error"]["code"], -32700);
}

#[tokio::test]
async fn test_rpc_when_body_over_limit_then_rejected() {
    let mut fixture = SwapFixture::new();
    fixture.state.max_body_bytes = 64;
    let request = Request::builder()
        .method("POST")
        .uri(RPC_PATH)
        .header("content-type", "application/json")
        .body(Body::from(format!("{{\"padding\":\"{}\"}}", "x".repeat(256))))
        .expect("request");

    let (status, _) = send(&fixture.router(), request).await;

    assert_eq!(status.as_u16(), 413);
}

#[tokio::test]
async fn test_rpc_echoes_caller_request_id() {
    let fixture = SwapFixture::new();
    let mut request = Request::builder()
        .method("POST")
        .uri(RPC_PATH)
        .header("content-type", "application/json")
        .header("x-request-id", "req-42")
        .body(Body::from(json!({ "jsonrpc": "2.0", "id": 1, "method": "nope" }).to_string()))
        .expect("request");
    request.extensions_mut().insert(axum::extract::ConnectInfo(std::net::SocketAddr::from(([127, 0, 0, 1], 10002))));

    let response = tower::ServiceExt::oneshot(fixture.router(), request).await.expect("response");

    assert_eq!(response.headers().get("x-request-id").and_then(|value| value.to_str().ok()), Some("req-42"));
}
