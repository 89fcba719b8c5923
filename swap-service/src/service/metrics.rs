use log::debug;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use swap_core::application::LifecycleObserver;
use swap_core::domain::ledger::OutPoint;
use swap_core::domain::reservation::PoolSnapshot;
use swap_core::domain::swap::SwapPhase;
use swap_core::foundation::{SwapError, TxHash};

#[derive(Debug, Clone, Copy)]
pub struct MetricsSnapshot {
    pub uptime: Duration,
    pub swaps_initiated: u64,
    pub swaps_confirmed: u64,
    pub swaps_failed: u64,
    pub rollbacks: u64,
    pub rpc_ok: u64,
    pub rpc_error: u64,
}

pub struct Metrics {
    registry: Registry,
    rpc_requests_total: IntCounterVec,
    swaps_total: IntCounterVec,
    swap_rollbacks_total: IntCounter,
    pool_cells: IntGaugeVec,
    worker_cycles_total: IntCounterVec,
    started_at: Instant,
    swaps_initiated: AtomicU64,
    swaps_confirmed: AtomicU64,
    swaps_failed: AtomicU64,
    rollbacks: AtomicU64,
    rpc_ok: AtomicU64,
    rpc_error: AtomicU64,
}

fn metrics_err(err: prometheus::Error) -> SwapError {
    SwapError::Message(format!("metrics: {err}"))
}

impl Metrics {
    pub fn new() -> Result<Self, SwapError> {
        debug!("initializing prometheus metrics");
        let registry = Registry::new();
        let rpc_requests_total =
            IntCounterVec::new(Opts::new("rpc_requests_total", "RPC requests by method and status"), &["method", "status"])
                .map_err(metrics_err)?;
        let swaps_total = IntCounterVec::new(Opts::new("swaps_total", "Swaps by stage reached"), &["stage"]).map_err(metrics_err)?;
        let swap_rollbacks_total =
            IntCounter::new("swap_rollbacks_total", "Committed reservations released after a failed confirm").map_err(metrics_err)?;
        let pool_cells = IntGaugeVec::new(Opts::new("pool_cells", "Cells per reservation pool"), &["pool"]).map_err(metrics_err)?;
        let worker_cycles_total =
            IntCounterVec::new(Opts::new("worker_cycles_total", "Worker cycles by worker and outcome"), &["worker", "status"])
                .map_err(metrics_err)?;

        registry.register(Box::new(rpc_requests_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(swaps_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(swap_rollbacks_total.clone())).map_err(metrics_err)?;
        registry.register(Box::new(pool_cells.clone())).map_err(metrics_err)?;
        registry.register(Box::new(worker_cycles_total.clone())).map_err(metrics_err)?;

        debug!("prometheus metrics registered metric_count=5");
        Ok(Self {
            registry,
            rpc_requests_total,
            swaps_total,
            swap_rollbacks_total,
            pool_cells,
            worker_cycles_total,
            started_at: Instant::now(),
            swaps_initiated: AtomicU64::new(0),
            swaps_confirmed: AtomicU64::new(0),
            swaps_failed: AtomicU64::new(0),
            rollbacks: AtomicU64::new(0),
            rpc_ok: AtomicU64::new(0),
            rpc_error: AtomicU64::new(0),
        })
    }

    pub fn inc_rpc_request(&self, method: &str, status: &str) {
        self.rpc_requests_total.with_label_values(&[method, status]).inc();
        match status {
            "ok" => {
                self.rpc_ok.fetch_add(1, Ordering::Relaxed);
            }
            "error" => {
                self.rpc_error.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    pub fn inc_swap_stage(&self, stage: &str) {
        self.swaps_total.with_label_values(&[stage]).inc();
    }

    pub fn set_pool_sizes(&self, snapshot: &PoolSnapshot) {
        for (pool, entries) in [("live", &snapshot.live), ("locked", &snapshot.locked), ("committing", &snapshot.committing)] {
            self.pool_cells.with_label_values(&[pool]).set(i64::try_from(entries.len()).unwrap_or(i64::MAX));
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime: self.started_at.elapsed(),
            swaps_initiated: self.swaps_initiated.load(Ordering::Relaxed),
            swaps_confirmed: self.swaps_confirmed.load(Ordering::Relaxed),
            swaps_failed: self.swaps_failed.load(Ordering::Relaxed),
            rollbacks: self.rollbacks.load(Ordering::Relaxed),
            rpc_ok: self.rpc_ok.load(Ordering::Relaxed),
            rpc_error: self.rpc_error.load(Ordering::Relaxed),
        }
    }

    pub fn encode(&self) -> Result<String, SwapError> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer).map_err(metrics_err)?;
        String::from_utf8(buffer).map_err(|err| SwapError::Message(err.to_string()))
    }
}

impl LifecycleObserver for Metrics {
    fn on_initiated(&self, _key: &OutPoint, _bid_shannons: u64, _ask_units: u128) {
        self.inc_swap_stage(SwapPhase::Initiated.as_str());
        self.swaps_initiated.fetch_add(1, Ordering::Relaxed);
    }

    fn on_confirmed(&self, _key: &OutPoint, _tx_hash: &TxHash) {
        self.inc_swap_stage(SwapPhase::Committed.as_str());
        self.swaps_confirmed.fetch_add(1, Ordering::Relaxed);
    }

    fn on_failed(&self, phase: SwapPhase, _error: &SwapError) {
        let stage = match phase {
            SwapPhase::Initiated => "initiate_failed",
            _ => "confirm_failed",
        };
        self.inc_swap_stage(stage);
        self.swaps_failed.fetch_add(1, Ordering::Relaxed);
    }

    fn on_rolled_back(&self, _key: &OutPoint, _cells: usize) {
        self.inc_swap_stage(SwapPhase::Cancelled.as_str());
        self.swap_rollbacks_total.inc();
        self.rollbacks.fetch_add(1, Ordering::Relaxed);
    }

    fn on_worker_cycle(&self, worker: &'static str, ok: bool) {
        self.worker_cycles_total.with_label_values(&[worker, if ok { "ok" } else { "error" }]).inc();
    }
}
