use super::{call_rpc, quantity, rpc_request, SwapFixture, CKB, UNIT};
use serde_json::json;
use swap_core::domain::ledger::Transaction;
use swap_core::infrastructure::storage::ReservationStore;
use swap_service::api::case::{to_case, tx_to_value, Case};

#[tokio::test]
async fn test_initiate_when_snake_tx_then_result_in_snake_case() {
    let fixture = SwapFixture::new();
    let tx = fixture.funded_trade().await;
    let params = json!([tx_to_value(&tx, Case::Snake).expect("tx json"), [0]]);

    let (status, body) = call_rpc(&fixture.router(), None, rpc_request("initiate", params)).await;

    assert!(status.is_success());
    let result = &body["result"];
    assert!(result["valid_until"].is_string());
    let bid = quantity(&result["bid_tokens"]);
    let ask = quantity(&result["ask_tokens"]);
    assert!(bid > u128::from(150 * CKB) && bid < u128::from(151 * CKB), "bid={bid}");
    assert!((1_500_000..1_510_000).contains(&ask), "ask={ask}");

    let transaction = &result["transaction"];
    assert_eq!(transaction["inputs"].as_array().expect("inputs").len(), 2);
    assert_eq!(transaction["outputs_data"].as_array().expect("outputs_data").len(), 2);
    assert_eq!(fixture.storage.pool_snapshot().expect("snapshot").locked.len(), 1);
}

#[tokio::test]
async fn test_initiate_when_camel_tx_then_result_in_camel_case() {
    let fixture = SwapFixture::new();
    let tx = fixture.funded_trade().await;
    let params = json!([tx_to_value(&tx, Case::Camel).expect("tx json"), [0]]);

    let (_, body) = call_rpc(&fixture.router(), None, rpc_request("initiate", params)).await;

    let result = &body["result"];
    assert!(result.get("validUntil").is_some(), "{body}");
    assert!(result.get("askTokens").is_some());
    assert!(result.get("bidTokens").is_some());
    assert!(result["transaction"].get("outputsData").is_some());
    assert!(result["transaction"].get("outputs_data").is_none());
    assert!(result["transaction"]["inputs"][1]["previousOutput"]["txHash"].is_string());
}

#[tokio::test]
async fn test_initiate_when_selector_given_then_overrides_detected_case() {
    let fixture = SwapFixture::new();
    let tx = fixture.funded_trade().await;
    let params = json!([tx_to_value(&tx, Case::Snake).expect("tx json"), [0], "camel"]);

    let (_, body) = call_rpc(&fixture.router(), None, rpc_request("initiate", params)).await;

    assert!(body["result"].get("validUntil").is_some(), "{body}");
}

#[tokio::test]
async fn test_initiate_when_params_malformed_then_invalid_params() {
    let fixture = SwapFixture::new();
    let router = fixture.router();
    let tx = tx_to_value(&fixture.funded_trade().await, Case::Snake).expect("tx json");

    for params in [json!({ "tx": tx.clone() }), json!([[0]]), json!([tx.clone()]), json!([tx, [-1]])] {
        let (_, body) = call_rpc(&router, None, rpc_request("initiate", params.clone())).await;
        assert_eq!(body["error"]["code"], -32602, "{params}");
    }
    assert!(fixture.storage.pool_snapshot().expect("snapshot").locked.is_empty());
}

#[tokio::test]
async fn test_initiate_when_bid_missing_then_invalid_input_code() {
    let fixture = SwapFixture::new();
    let caller = fixture.add_caller_cell(1, 300 * CKB);
    fixture.add_fund_cell(10, 1_000 * CKB, 0);
    fixture.refresh().await;
    let tx = super::trade_tx(&caller, 250 * CKB, 1_000 * UNIT);

    let (_, body) =
        call_rpc(&fixture.router(), None, rpc_request("initiate", json!([tx_to_value(&tx, Case::Snake).expect("tx"), [0]])))
            .await;

    assert_eq!(body["error"]["code"], 2001);
    assert_eq!(body["error"]["message"], "Input ckbytes are enough for output ckbytes!");
    assert!(body["error"].get("data").is_none());
}

#[tokio::test]
async fn test_initiate_when_pool_empty_then_server_code() {
    let fixture = SwapFixture::new();
    let caller = fixture.add_caller_cell(1, 100 * CKB);
    let tx = super::trade_tx(&caller, 250 * CKB, 1_000 * UNIT);

    let (_, body) =
        call_rpc(&fixture.router(), None, rpc_request("initiate", json!([tx_to_value(&tx, Case::Snake).expect("tx"), [0]])))
            .await;

    assert_eq!(body["error"]["code"], 2002);
}

async fn initiate(fixture: &SwapFixture, case: Case) -> serde_json::Value {
    let tx = fixture.funded_trade().await;
    let params = json!([tx_to_value(&tx, case).expect("tx json"), [0]]);
    let (_, body) = call_rpc(&fixture.router(), None, rpc_request("initiate", params)).await;
    body["result"]["transaction"].clone()
}

#[tokio::test]
async fn test_confirm_when_signer_running_then_returns_broadcast_tx() {
    let fixture = SwapFixture::new();
    let transaction = initiate(&fixture, Case::Snake).await;
    let worker = fixture.spawn_signer();

    let (_, body) = call_rpc(&fixture.router(), None, rpc_request("confirm", json!([transaction]))).await;
    worker.abort();

    let signed = &body["result"]["tx"];
    assert!(signed.get("outputs_data").is_some(), "{body}");
    let submitted = fixture.chain.submitted();
    assert_eq!(submitted.len(), 1);
    let parsed: Transaction = swap_service::api::case::parse_params(Some(json!([signed.clone()]))).expect("params").tx;
    assert_eq!(parsed.hash(), submitted[0].hash());
    assert_eq!(fixture.metrics().snapshot().swaps_confirmed, 1);
}

#[tokio::test]
async fn test_confirm_when_camel_tx_then_answers_in_camel() {
    let fixture = SwapFixture::new();
    let transaction = initiate(&fixture, Case::Snake).await;
    let worker = fixture.spawn_signer();

    let camel = to_case(transaction, Case::Camel);
    let (_, body) = call_rpc(&fixture.router(), None, rpc_request("confirm", json!([camel]))).await;
    worker.abort();

    assert!(body["result"]["tx"].get("outputsData").is_some(), "{body}");
}

#[tokio::test]
async fn test_confirm_when_tx_altered_then_invalid_input_and_cell_stays_locked() {
    let fixture = SwapFixture::new();
    let mut transaction = initiate(&fixture, Case::Snake).await;
    transaction["outputs"][0]["capacity"] = json!(format!("{:#x}", 251 * CKB));

    let (_, body) = call_rpc(&fixture.router(), None, rpc_request("confirm", json!([transaction]))).await;

    assert_eq!(body["error"]["code"], 2001);
    assert_eq!(body["error"]["message"], "Locked cell is missing, invalid or expired!");
    assert_eq!(fixture.storage.pool_snapshot().expect("snapshot").locked.len(), 1);
}

#[tokio::test]
async fn test_confirm_when_broadcast_rejected_then_error_carries_signed_tx() {
    let fixture = SwapFixture::new();
    let transaction = initiate(&fixture, Case::Snake).await;
    fixture.chain.fail_sends(Some("PoolRejectedTransactionByMinFeeRate"));
    let worker = fixture.spawn_signer();

    let camel = to_case(transaction, Case::Camel);
    let (_, body) = call_rpc(&fixture.router(), None, rpc_request("confirm", json!([camel]))).await;
    worker.abort();

    assert_eq!(body["error"]["code"], 2003, "{body}");
    assert!(body["error"]["message"].as_str().expect("message").contains("PoolRejectedTransactionByMinFeeRate"));
    assert!(body["error"]["data"].get("outputsData").is_some(), "{body}");
    let snapshot = fixture.storage.pool_snapshot().expect("snapshot");
    assert!(snapshot.locked.is_empty());
    assert!(snapshot.committing.is_empty());
    assert_eq!(fixture.metrics().snapshot().rollbacks, 1);
}
