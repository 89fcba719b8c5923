#![allow(dead_code)]

mod auth_test;
mod batch_test;
mod health_test;
mod sign_test;
mod swap_test;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use axum::Router;
use secp256k1::SecretKey;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use swap_core::application::{EndpointSigner, FundPool, LifecycleObserver, Refresher, SignerWorker, SwapContext, SwapService, SwapSettings};
use swap_core::domain::ledger::signature::secret_key_hash;
use swap_core::domain::ledger::udt::encode_udt_amount;
use swap_core::domain::ledger::{Cell, CellDep, CellInput, CellOutput, DepType, HashType, OutPoint, Script, Transaction, WitnessArgs};
use swap_core::domain::multisig::MultisigConfig;
use swap_core::domain::pricing::parse_price;
use swap_core::foundation::{Byte32, TxHash, UdtName, MAX_RPC_BODY_BYTES, SHANNONS_PER_CKB, SIGNATURE_SIZE};
use swap_core::infrastructure::chain::{KnownScript, MockChain, ScriptInfo, ScriptRegistry};
use swap_core::infrastructure::queue::MemoryJobQueue;
use swap_core::infrastructure::rpc::BackoffPolicy;
use swap_core::infrastructure::signing::SingleKeySigner;
use swap_core::infrastructure::storage::{MemoryStorage, Storage, SwapStorage};
use swap_service::api::{build_router, RpcState};
use swap_service::service::metrics::Metrics;
use swap_service::service::ServiceMode;
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tower::ServiceExt;

pub const CKB: u64 = SHANNONS_PER_CKB;
pub const UNIT: u128 = 1_000_000;
pub const RPC_PATH: &str = "/rpc";

const FUND_SECRET: [u8; 32] = [0x11; 32];
const MULTISIG_SECRETS: [[u8; 32]; 3] = [[0x21; 32], [0x22; 32], [0x23; 32]];
const SECP_CODE_HASH: [u8; 32] = [0x9b; 32];
const MULTISIG_CODE_HASH: [u8; 32] = [0x5c; 32];
const UDT_CODE_HASH: [u8; 32] = [0x5e; 32];
const UDT_ARGS: [u8; 32] = [0x22; 32];
const CALLER_LOCK_ARGS: [u8; 20] = [0xca; 20];

fn client_addr() -> SocketAddr {
    "127.0.0.1:10001".parse().expect("addr")
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let mut request = request;
    request.extensions_mut().insert(ConnectInfo(client_addr()));
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
    (status, bytes.to_vec())
}

pub async fn call_rpc(router: &Router, token: Option<&str>, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method("POST").uri(RPC_PATH).header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = builder.body(Body::from(serde_json::to_string(&body).expect("serialize body"))).expect("request");
    let (status, bytes) = send(router, request).await;
    (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
}

pub async fn get(router: &Router, path: &str, token: Option<&str>) -> (StatusCode, String) {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = token {
        builder = builder.header("x-api-key", token);
    }
    let (status, bytes) = send(router, builder.body(Body::empty()).expect("request")).await;
    (status, String::from_utf8(bytes).expect("utf8 body"))
}

pub fn rpc_request(method: &str, params: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params })
}

/// Parses a `0x`-prefixed hex quantity.
pub fn quantity(value: &serde_json::Value) -> u128 {
    let text = value.as_str().expect("quantity string");
    u128::from_str_radix(text.trim_start_matches("0x"), 16).expect("hex quantity")
}

pub fn out_point(n: u8) -> OutPoint {
    OutPoint::new(TxHash::new([n; 32]), u32::from(n))
}

pub fn udt_script() -> Script {
    Script::new(Byte32::new(UDT_CODE_HASH), HashType::Type, UDT_ARGS.to_vec())
}

pub fn caller_lock() -> Script {
    Script::new(Byte32::new(SECP_CODE_HASH), HashType::Type, CALLER_LOCK_ARGS.to_vec())
}

pub fn registry() -> ScriptRegistry {
    let dep = |byte| CellDep { out_point: OutPoint::new(TxHash::new([byte; 32]), 0), dep_type: DepType::DepGroup };
    let mut registry = ScriptRegistry::default();
    registry.insert(
        KnownScript::Secp256k1Blake160,
        ScriptInfo { code_hash: Byte32::new(SECP_CODE_HASH), hash_type: HashType::Type, cell_deps: vec![dep(0xd1)] },
    );
    registry.insert(
        KnownScript::Secp256k1Multisig,
        ScriptInfo { code_hash: Byte32::new(MULTISIG_CODE_HASH), hash_type: HashType::Type, cell_deps: vec![dep(0xd2)] },
    );
    registry
}

pub fn test_settings() -> SwapSettings {
    SwapSettings {
        udt_name: UdtName::new("USDI"),
        udt_script: udt_script(),
        udt_cell_deps: Vec::new(),
        locked_seconds: 60,
        committing_seconds: 120,
        incentive_percent: Decimal::ZERO,
        max_traded: 100_000 * CKB,
        initial_udt_cell: 1_000 * CKB,
        min_udt_cell: 150 * CKB,
        collection_lock: None,
        collection_cap: None,
        sign_timeout: Duration::from_secs(5),
        sign_poll: BackoffPolicy::new(Duration::from_millis(5), Duration::from_millis(50)),
    }
}

/// Caller transaction spending `input` for one asset output of `output_capacity` holding `asset`.
pub fn trade_tx(input: &Cell, output_capacity: u64, asset: u128) -> Transaction {
    let mut tx = Transaction::default();
    tx.inputs.push(CellInput::new(input.out_point));
    tx.add_output(CellOutput { capacity: output_capacity, lock: caller_lock(), type_: Some(udt_script()) }, encode_udt_amount(asset));
    tx.set_witness_args(0, &WitnessArgs::with_lock(vec![0u8; SIGNATURE_SIZE]));
    tx
}

fn base_state(mode: ServiceMode, metrics: Arc<Metrics>) -> RpcState {
    RpcState {
        mode,
        swap: None,
        signer: None,
        storage: None,
        rpc_token: None,
        rpc_path: RPC_PATH.to_string(),
        log_request: false,
        max_body_bytes: MAX_RPC_BODY_BYTES,
        metrics,
    }
}

/// `all` mode over a single-key pool on the in-memory chain and store.
pub struct SwapFixture {
    pub chain: Arc<MockChain>,
    pub storage: Arc<MemoryStorage>,
    pub secret: SecretKey,
    pub ctx: SwapContext,
    pub state: RpcState,
}

impl SwapFixture {
    pub fn new() -> Self {
        let secret = SecretKey::from_slice(&FUND_SECRET).expect("secret");
        let fund_pool = FundPool::singlesig(&secret, &registry()).expect("fund pool");
        let chain = Arc::new(MockChain::new(registry()));
        let storage = Arc::new(MemoryStorage::new());
        let metrics = Arc::new(Metrics::new().expect("metrics"));
        let ctx = SwapContext::new(storage.clone(), chain.clone(), Arc::new(MemoryJobQueue::new()), fund_pool, test_settings())
            .with_observer(metrics.clone() as Arc<dyn LifecycleObserver>);
        storage.set_price(&ctx.settings.udt_name, parse_price("0.01").expect("price")).expect("set price");

        let mut state = base_state(ServiceMode::All, metrics);
        state.swap = Some(Arc::new(SwapService::new(ctx.clone())));
        state.storage = Some(storage.clone() as Arc<dyn SwapStorage>);
        Self { chain, storage, secret, ctx, state }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.state.rpc_token = Some(token.to_string());
        self
    }

    pub fn router(&self) -> Router {
        build_router(Arc::new(self.state.clone()))
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.state.metrics.clone()
    }

    pub fn add_caller_cell(&self, n: u8, capacity: u64) -> Cell {
        let cell = Cell { out_point: out_point(n), output: CellOutput { capacity, lock: caller_lock(), type_: None }, data: Vec::new() };
        self.chain.add_live_cell(cell.clone());
        cell
    }

    pub fn add_fund_cell(&self, n: u8, capacity: u64, amount: u128) -> Cell {
        let output = CellOutput { capacity, lock: self.ctx.fund_pool.lock.clone(), type_: Some(udt_script()) };
        let cell = Cell { out_point: out_point(n), output, data: encode_udt_amount(amount) };
        self.chain.add_live_cell(cell.clone());
        cell
    }

    pub async fn refresh(&self) {
        Refresher::new(self.ctx.clone()).run_cycle().await.expect("refresh cycle");
    }

    /// A caller cell, one fund cell in LIVE and a trade it can cover.
    pub async fn funded_trade(&self) -> Transaction {
        let caller = self.add_caller_cell(1, 100 * CKB);
        self.add_fund_cell(10, 1_000 * CKB, 0);
        self.refresh().await;
        trade_tx(&caller, 250 * CKB, 1_000 * UNIT)
    }

    pub fn spawn_signer(&self) -> JoinHandle<()> {
        let signer = SingleKeySigner::new(self.secret, self.ctx.fund_pool.lock.clone(), self.chain.clone());
        let worker = SignerWorker::new(self.ctx.clone(), Arc::new(signer));
        tokio::spawn(async move {
            let _ = worker.run().await;
        })
    }
}

/// `multisig-signer` mode holding the key of the first of three endpoints.
pub struct SignerFixture {
    pub chain: Arc<MockChain>,
    pub fund_pool: FundPool,
    pub secret: SecretKey,
    pub state: RpcState,
}

impl SignerFixture {
    pub fn new() -> Self {
        let secrets = MULTISIG_SECRETS.iter().map(|bytes| SecretKey::from_slice(bytes).expect("secret")).collect::<Vec<_>>();
        let hashes = secrets.iter().map(secret_key_hash).collect::<Vec<_>>();
        let endpoints = (0..secrets.len()).map(|index| format!("http://signer-{index}")).collect::<Vec<_>>();
        let config = MultisigConfig::new(1, 2, hashes, endpoints).expect("multisig config");
        let fund_pool = FundPool::multisig(config, &registry()).expect("fund pool");
        let chain = Arc::new(MockChain::new(registry()));
        let signer = EndpointSigner::new(secrets[0], &fund_pool, chain.clone()).expect("endpoint signer");

        let mut state = base_state(ServiceMode::MultisigSigner, Arc::new(Metrics::new().expect("metrics")));
        state.signer = Some(Arc::new(signer));
        Self { chain, fund_pool, secret: secrets[0], state }
    }

    pub fn router(&self) -> Router {
        build_router(Arc::new(self.state.clone()))
    }

    /// Transaction spending one multisig fund cell at input 0, witness lock zeroed to the placeholder.
    pub fn fund_spend(&self) -> Transaction {
        let output = CellOutput { capacity: 1_000 * CKB, lock: self.fund_pool.lock.clone(), type_: Some(udt_script()) };
        let cell = Cell { out_point: out_point(10), output: output.clone(), data: encode_udt_amount(0) };
        self.chain.add_live_cell(cell.clone());

        let mut tx = Transaction::default();
        tx.inputs.push(CellInput::new(cell.out_point));
        tx.add_output(output, encode_udt_amount(0));
        tx.set_witness_args(0, &WitnessArgs::with_lock(self.fund_pool.witness_placeholder.clone()));
        tx
    }
}
