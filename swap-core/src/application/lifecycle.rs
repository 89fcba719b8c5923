use crate::domain::ledger::OutPoint;
use crate::domain::swap::SwapPhase;
use crate::foundation::{SwapError, TxHash};
use log::{debug, trace};
use std::sync::Arc;

/// Hooks fired as swaps move through their phases and workers complete cycles.
pub trait LifecycleObserver: Send + Sync {
    fn on_initiated(&self, _key: &OutPoint, _bid_shannons: u64, _ask_units: u128) {}
    fn on_confirmed(&self, _key: &OutPoint, _tx_hash: &TxHash) {}
    /// `phase` is the phase the swap failed to enter.
    fn on_failed(&self, _phase: SwapPhase, _error: &SwapError) {}
    fn on_rolled_back(&self, _key: &OutPoint, _cells: usize) {}
    fn on_worker_cycle(&self, _worker: &'static str, _ok: bool) {}
}

pub struct NoopObserver;

impl LifecycleObserver for NoopObserver {}

pub struct CompositeObserver {
    observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub fn add_observer(&mut self, observer: Arc<dyn LifecycleObserver>) {
        self.observers.push(observer);
    }
}

impl Default for CompositeObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl LifecycleObserver for CompositeObserver {
    fn on_initiated(&self, key: &OutPoint, bid_shannons: u64, ask_units: u128) {
        trace!("on_initiated dispatch observer_count={} key={}", self.observers.len(), key);
        for observer in &self.observers {
            observer.on_initiated(key, bid_shannons, ask_units);
        }
    }

    fn on_confirmed(&self, key: &OutPoint, tx_hash: &TxHash) {
        trace!("on_confirmed dispatch observer_count={} key={} tx_hash={}", self.observers.len(), key, tx_hash);
        for observer in &self.observers {
            observer.on_confirmed(key, tx_hash);
        }
    }

    fn on_failed(&self, phase: SwapPhase, error: &SwapError) {
        debug!("swap failed phase={} code={:?} error={}", phase.as_str(), error.code(), error);
        for observer in &self.observers {
            observer.on_failed(phase, error);
        }
    }

    fn on_rolled_back(&self, key: &OutPoint, cells: usize) {
        debug!("reservation rolled back key={} cells={}", key, cells);
        for observer in &self.observers {
            observer.on_rolled_back(key, cells);
        }
    }

    fn on_worker_cycle(&self, worker: &'static str, ok: bool) {
        for observer in &self.observers {
            observer.on_worker_cycle(worker, ok);
        }
    }
}
