use super::{get, SignerFixture, SwapFixture};
use axum::http::StatusCode;
use std::sync::Arc;
use swap_core::infrastructure::storage::{RocksStorage, SwapStorage};
use tempfile::TempDir;

#[tokio::test]
async fn test_health_reports_mode_without_auth() {
    let fixture = SwapFixture::new().with_token("secret-token");
    let (status, body) = get(&fixture.router(), "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let value: serde_json::Value = serde_json::from_str(&body).expect("json");
    assert_eq!(value["status"], "healthy");
    assert_eq!(value["mode"], "all");

    let signer = SignerFixture::new();
    let (_, body) = get(&signer.router(), "/health", None).await;
    let value: serde_json::Value = serde_json::from_str(&body).expect("json");
    assert_eq!(value["mode"], "multisig-signer");
}

#[tokio::test]
async fn test_ready_when_storage_healthy_then_ready() {
    let temp_dir = TempDir::new().expect("temp dir");
    let storage = RocksStorage::open_in_dir_with_options(temp_dir.path(), false).expect("storage");
    let mut fixture = SwapFixture::new();
    fixture.state.storage = Some(Arc::new(storage) as Arc<dyn SwapStorage>);

    let (status, body) = get(&fixture.router(), "/ready", None).await;

    assert_eq!(status, StatusCode::OK);
    let value: serde_json::Value = serde_json::from_str(&body).expect("json");
    assert_eq!(value["status"], "ready");
    assert_eq!(value["storage_ok"], true);
}

#[tokio::test]
async fn test_ready_and_metrics_when_token_missing_then_unauthorized() {
    let fixture = SwapFixture::new().with_token("secret-token");
    let router = fixture.router();

    assert_eq!(get(&router, "/ready", None).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(get(&router, "/metrics", None).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(get(&router, "/ready", Some("secret-token")).await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_exposes_pool_sizes_and_rpc_counters() {
    let fixture = SwapFixture::new();
    fixture.add_fund_cell(10, 1_000 * super::CKB, 0);
    fixture.add_fund_cell(11, 1_000 * super::CKB, 0);
    fixture.refresh().await;
    let router = fixture.router();
    let _ = super::call_rpc(&router, None, super::rpc_request("nope", serde_json::json!([]))).await;

    let (status, body) = get(&router, "/metrics", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("pool_cells{pool=\"live\"} 2"), "{body}");
    assert!(body.contains("rpc_requests_total{method=\"unknown\",status=\"not_found\"} 1"), "{body}");
}
