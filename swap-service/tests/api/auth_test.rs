use super::{call_rpc, rpc_request, SignerFixture, SwapFixture};
use serde_json::json;

#[tokio::test]
async fn test_rpc_when_token_configured_and_missing_then_unauthorized() {
    let fixture = SwapFixture::new().with_token("secret-token");
    let router = fixture.router();

    let (status, body) = call_rpc(&router, None, rpc_request("initiate", json!([{}, [0]]))).await;

    assert!(status.is_success());
    assert_eq!(body["error"]["code"], -32001);
    assert_eq!(body["id"], 1);
}

#[tokio::test]
async fn test_rpc_when_token_wrong_then_unauthorized_and_right_token_passes() {
    let fixture = SwapFixture::new().with_token("secret-token");
    let router = fixture.router();

    let (_, rejected) = call_rpc(&router, Some("nope"), rpc_request("initiate", json!("not-an-array"))).await;
    assert_eq!(rejected["error"]["code"], -32001);

    let (_, accepted) = call_rpc(&router, Some("secret-token"), rpc_request("initiate", json!("not-an-array"))).await;
    assert_eq!(accepted["error"]["code"], -32602);
}

#[tokio::test]
async fn test_rpc_when_method_belongs_to_other_mode_then_method_not_found() {
    let swap = SwapFixture::new();
    let (_, body) = call_rpc(&swap.router(), None, rpc_request("sign", json!([{}]))).await;
    assert_eq!(body["error"]["code"], -32601);

    let signer = SignerFixture::new();
    for method in ["initiate", "confirm", "does_not_exist"] {
        let (_, body) = call_rpc(&signer.router(), None, rpc_request(method, json!([{}]))).await;
        assert_eq!(body["error"]["code"], -32601, "{method}");
    }
}

#[tokio::test]
async fn test_rpc_when_jsonrpc_version_wrong_then_invalid_request() {
    let fixture = SwapFixture::new();
    let body = json!({ "jsonrpc": "1.0", "id": 3, "method": "initiate", "params": [] });

    let (_, reply) = call_rpc(&fixture.router(), None, body).await;

    assert_eq!(reply["error"]["code"], -32600);
    assert_eq!(reply["id"], 3);
}
