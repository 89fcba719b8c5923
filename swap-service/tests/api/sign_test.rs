use super::{call_rpc, rpc_request, SignerFixture};
use serde_json::json;
use swap_core::domain::ledger::sighash::sighash_all_message;
use swap_core::domain::ledger::signature::{secret_key_hash, verify_pubkey_hash};
use swap_core::domain::ledger::Transaction;
use swap_service::api::case::{tx_to_value, Case};

fn signature_bytes(value: &serde_json::Value) -> Vec<u8> {
    hex::decode(value.as_str().expect("signature").trim_start_matches("0x")).expect("hex signature")
}

#[tokio::test]
async fn test_sign_when_tx_spends_fund_cell_then_returns_signature_of_endpoint_key() {
    let fixture = SignerFixture::new();
    let tx = fixture.fund_spend();

    let (_, body) = call_rpc(&fixture.router(), None, rpc_request("sign", json!([tx_to_value(&tx, Case::Snake).expect("tx"), "snake"])))
        .await;

    let signature = signature_bytes(&body["result"]["signature"]);
    assert_eq!(signature.len(), 65, "{body}");
    let message = sighash_all_message(&tx, &[0]).expect("message");
    assert!(verify_pubkey_hash(&signature, &message, &secret_key_hash(&fixture.secret)));
}

#[tokio::test]
async fn test_sign_when_camel_tx_then_same_signature() {
    let fixture = SignerFixture::new();
    let tx = fixture.fund_spend();
    let router = fixture.router();

    let (_, snake) = call_rpc(&router, None, rpc_request("sign", json!([tx_to_value(&tx, Case::Snake).expect("tx")]))).await;
    let (_, camel) = call_rpc(&router, None, rpc_request("sign", json!([tx_to_value(&tx, Case::Camel).expect("tx")]))).await;

    assert_eq!(snake["result"]["signature"], camel["result"]["signature"]);
}

#[tokio::test]
async fn test_sign_when_no_fund_cell_spent_then_invalid_input() {
    let fixture = SignerFixture::new();
    let tx = Transaction::default();

    let (_, body) = call_rpc(&fixture.router(), None, rpc_request("sign", json!([tx_to_value(&tx, Case::Snake).expect("tx")]))).await;

    assert_eq!(body["error"]["code"], 2001, "{body}");
}
