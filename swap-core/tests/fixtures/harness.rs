#![allow(dead_code)]

use crate::fixtures::builders::*;
use crate::fixtures::constants::*;
use secp256k1::SecretKey;
use std::sync::Arc;
use std::time::Duration;
use swap_core::application::{FundPool, RefreshReport, Refresher, SignerWorker, SwapContext, SwapService, SwapSettings};
use swap_core::domain::ledger::{Cell, Script};
use swap_core::domain::pricing::parse_price;
use swap_core::domain::reservation::PoolSnapshot;
use swap_core::foundation::UdtName;
use swap_core::infrastructure::chain::MockChain;
use swap_core::infrastructure::queue::MemoryJobQueue;
use swap_core::infrastructure::rpc::BackoffPolicy;
use swap_core::infrastructure::signing::SingleKeySigner;
use swap_core::infrastructure::storage::{MemoryStorage, ReservationStore, Storage};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;

pub fn test_settings() -> SwapSettings {
    SwapSettings {
        udt_name: UdtName::new(TEST_UDT_NAME),
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

/// Single-key swap service over the in-memory chain, store and queue.
pub struct Harness {
    pub chain: Arc<MockChain>,
    pub storage: Arc<MemoryStorage>,
    pub queue: Arc<MemoryJobQueue>,
    pub secret: SecretKey,
    pub ctx: SwapContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    pub fn with_settings(settings: SwapSettings) -> Self {
        let harness = Self::unpriced(settings);
        harness.set_price(TEST_PRICE);
        harness
    }

    /// Single-key pool with no price stored yet.
    pub fn unpriced(settings: SwapSettings) -> Self {
        let secret = SecretKey::from_slice(&FUND_SECRET).expect("secret");
        let fund_pool = FundPool::singlesig(&secret, &registry()).expect("fund pool");
        Self::with_fund_pool(settings, fund_pool, secret)
    }

    /// `secret` signs for the single-key worker; multisig pools ignore it. No price is stored.
    pub fn with_fund_pool(settings: SwapSettings, fund_pool: FundPool, secret: SecretKey) -> Self {
        let chain = Arc::new(MockChain::new(registry()));
        let storage = Arc::new(MemoryStorage::new());
        let queue = Arc::new(MemoryJobQueue::new());
        let ctx = SwapContext::new(storage.clone(), chain.clone(), queue.clone(), fund_pool, settings);
        Self { chain, storage, queue, secret, ctx }
    }

    pub fn set_price(&self, price: &str) {
        let price = parse_price(price).expect("price");
        self.storage.set_price(&self.ctx.settings.udt_name, price).expect("set price");
    }

    pub fn fund_lock(&self) -> Script {
        self.ctx.fund_pool.lock.clone()
    }

    pub fn service(&self) -> SwapService {
        SwapService::new(self.ctx.clone())
    }

    /// Live asset cell under the funding lock.
    pub fn add_fund_cell(&self, n: u8, capacity: u64, amount: u128) -> Cell {
        let cell = asset_cell(n, self.fund_lock(), capacity, amount);
        self.chain.add_live_cell(cell.clone());
        cell
    }

    /// Live plain cell under the funding lock.
    pub fn add_fund_dust(&self, n: u8, capacity: u64) -> Cell {
        let cell = plain_cell(n, self.fund_lock(), capacity);
        self.chain.add_live_cell(cell.clone());
        cell
    }

    pub fn add_caller_cell(&self, n: u8, capacity: u64) -> Cell {
        let cell = plain_cell(n, caller_lock(), capacity);
        self.chain.add_live_cell(cell.clone());
        cell
    }

    pub async fn refresh(&self) -> RefreshReport {
        Refresher::new(self.ctx.clone()).run_cycle().await.expect("refresh cycle")
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        self.storage.pool_snapshot().expect("snapshot")
    }

    pub fn signer_worker(&self) -> SignerWorker {
        let signer = SingleKeySigner::new(self.secret, self.fund_lock(), self.chain.clone());
        SignerWorker::new(self.ctx.clone(), Arc::new(signer))
    }

    pub fn spawn_signer(&self) -> JoinHandle<()> {
        let worker = self.signer_worker();
        tokio::spawn(async move {
            let _ = worker.run().await;
        })
    }
}
