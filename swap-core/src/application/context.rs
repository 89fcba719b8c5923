//! Everything a swap flow or worker needs, built once at startup and cloned into each task.

use crate::application::funding::FundPool;
use crate::application::lifecycle::{LifecycleObserver, NoopObserver};
use crate::domain::ledger::{CellDep, Script};
use crate::domain::pricing::{asset_units, ckb_to_shannons, incentive_percent};
use crate::foundation::{Result, SwapError, UdtName};
use crate::infrastructure::chain::ChainClient;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::queue::JobQueue;
use crate::infrastructure::rpc::BackoffPolicy;
use crate::infrastructure::storage::SwapStorage;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

/// Trading parameters resolved from config into chain units.
#[derive(Clone, Debug)]
pub struct SwapSettings {
    pub udt_name: UdtName,
    pub udt_script: Script,
    pub udt_cell_deps: Vec<CellDep>,
    pub locked_seconds: u64,
    pub committing_seconds: u64,
    pub incentive_percent: Decimal,
    /// Largest bid, in shannons.
    pub max_traded: u64,
    pub initial_udt_cell: u64,
    /// Asset cells below this capacity are dust.
    pub min_udt_cell: u64,
    pub collection_lock: Option<Script>,
    pub collection_cap: Option<u128>,
    pub sign_timeout: Duration,
    pub sign_poll: BackoffPolicy,
}

impl SwapSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let swap = &config.swap;
        let udt_script = config.udt.script.as_ref().ok_or_else(|| SwapError::ConfigError("udt.script is required".to_string()))?.to_script()?;
        let udt_cell_deps = config.udt.cell_deps.iter().map(|dep| dep.to_cell_dep()).collect::<Result<Vec<_>>>()?;
        let collection_lock = config.fund_pool.collection_lock.as_ref().map(|lock| lock.to_script()).transpose()?;
        let collection_cap = config.workers.udt_collection_cap.map(asset_units).transpose()?;
        Ok(Self {
            udt_name: UdtName::new(config.udt.name.trim()),
            udt_script,
            udt_cell_deps,
            locked_seconds: swap.locked_seconds,
            committing_seconds: swap.committing_seconds,
            incentive_percent: incentive_percent(swap.incentive_percent)?,
            max_traded: ckb_to_shannons(swap.max_traded_ckb)?,
            initial_udt_cell: ckb_to_shannons(swap.initial_udt_cell_ckb)?,
            min_udt_cell: ckb_to_shannons(swap.min_udt_cell_ckb)?,
            collection_lock,
            collection_cap,
            sign_timeout: Duration::from_secs(swap.sign_timeout_secs.unwrap_or(swap.committing_seconds)),
            sign_poll: BackoffPolicy::new(
                Duration::from_millis(swap.sign_poll_initial_ms),
                Duration::from_millis(swap.sign_poll_max_ms),
            ),
        })
    }
}

/// Shared handles. Cheap to clone.
#[derive(Clone)]
pub struct SwapContext {
    pub storage: Arc<dyn SwapStorage>,
    pub chain: Arc<dyn ChainClient>,
    pub queue: Arc<dyn JobQueue>,
    pub fund_pool: Arc<FundPool>,
    pub settings: Arc<SwapSettings>,
    pub observer: Arc<dyn LifecycleObserver>,
}

impl SwapContext {
    pub fn new(
        storage: Arc<dyn SwapStorage>,
        chain: Arc<dyn ChainClient>,
        queue: Arc<dyn JobQueue>,
        fund_pool: FundPool,
        settings: SwapSettings,
    ) -> Self {
        Self { storage, chain, queue, fund_pool: Arc::new(fund_pool), settings: Arc::new(settings), observer: Arc::new(NoopObserver) }
    }

    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Locks whose cells callers may never spend into a trade.
    pub fn service_locks(&self) -> Vec<&Script> {
        std::iter::once(&self.fund_pool.lock).chain(self.settings.collection_lock.as_ref()).collect()
    }
}
