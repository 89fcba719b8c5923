use super::{CellPage, CellQuery, ChainClient, KnownScript, ScriptInfo, ScriptRegistry, TxStatus};
use crate::domain::ledger::molecule;
use crate::domain::ledger::{Cell, OutPoint, Transaction};
use crate::foundation::{Result, SwapError, TxHash};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MockInner {
    live: BTreeMap<OutPoint, Cell>,
    statuses: HashMap<TxHash, TxStatus>,
    submitted: Vec<Transaction>,
    send_error: Option<String>,
    fee_rate_median: Option<u64>,
}

/// In-memory chain for tests: live cells, transaction statuses and every submitted transaction.
#[derive(Default)]
pub struct MockChain {
    inner: Mutex<MockInner>,
    scripts: ScriptRegistry,
}

impl MockChain {
    pub fn new(scripts: ScriptRegistry) -> Self {
        Self { inner: Mutex::new(MockInner::default()), scripts }
    }

    fn lock_inner(&self) -> Result<MutexGuard<'_, MockInner>> {
        self.inner
            .lock()
            .map_err(|_| SwapError::StorageError { operation: "mock chain lock".to_string(), details: "poisoned".to_string() })
    }

    pub fn add_live_cell(&self, cell: Cell) {
        if let Ok(mut inner) = self.lock_inner() {
            inner.live.insert(cell.out_point, cell);
        }
    }

    pub fn remove_live_cell(&self, out_point: &OutPoint) {
        if let Ok(mut inner) = self.lock_inner() {
            inner.live.remove(out_point);
        }
    }

    pub fn set_status(&self, tx_hash: TxHash, status: TxStatus) {
        if let Ok(mut inner) = self.lock_inner() {
            inner.statuses.insert(tx_hash, status);
        }
    }

    /// Makes every following `send_transaction` fail with `message`; `None` restores success.
    pub fn fail_sends(&self, message: Option<&str>) {
        if let Ok(mut inner) = self.lock_inner() {
            inner.send_error = message.map(str::to_string);
        }
    }

    pub fn set_fee_rate_median(&self, median: Option<u64>) {
        if let Ok(mut inner) = self.lock_inner() {
            inner.fee_rate_median = median;
        }
    }

    pub fn submitted(&self) -> Vec<Transaction> {
        self.lock_inner().map(|inner| inner.submitted.clone()).unwrap_or_default()
    }

    fn matches(query: &CellQuery, cell: &Cell) -> bool {
        let in_range = |range: Option<(u64, u64)>, len: u64| range.map_or(true, |(start, end)| start <= len && len < end);
        let type_len = cell.output.type_.as_ref().map_or(0, |script| molecule::script(script).len() as u64);
        cell.output.lock == query.lock
            && query.type_script.as_ref().map_or(true, |script| cell.output.type_.as_ref() == Some(script))
            && in_range(query.type_len_range, type_len)
            && in_range(query.data_len_range, cell.data.len() as u64)
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn known_script(&self, script: KnownScript) -> Result<ScriptInfo> {
        self.scripts.get(script)
    }

    async fn get_live_cell(&self, out_point: &OutPoint) -> Result<Option<Cell>> {
        Ok(self.lock_inner()?.live.get(out_point).cloned())
    }

    async fn find_cells(&self, query: &CellQuery, cursor: Option<String>, limit: u32) -> Result<CellPage> {
        let offset = match cursor {
            Some(cursor) => cursor.parse::<usize>().map_err(|err| SwapError::node_rpc(format!("bad cursor: {err}")))?,
            None => 0,
        };
        let inner = self.lock_inner()?;
        let matching = inner.live.values().filter(|cell| Self::matches(query, cell)).collect::<Vec<_>>();
        let end = (offset + limit as usize).min(matching.len());
        let cells = matching.get(offset..end).unwrap_or_default().iter().map(|cell| (*cell).clone()).collect();
        Ok(CellPage { cells, cursor: (end < matching.len()).then(|| end.to_string()) })
    }

    async fn fee_rate_statistics(&self) -> Result<Option<u64>> {
        Ok(self.lock_inner()?.fee_rate_median)
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<TxHash> {
        let mut inner = self.lock_inner()?;
        if let Some(message) = inner.send_error.clone() {
            return Err(SwapError::node_rpc(message));
        }
        let hash = tx.hash();
        inner.submitted.push(tx.clone());
        inner.statuses.insert(hash, TxStatus::Pending);
        Ok(hash)
    }

    async fn get_transaction_status(&self, tx_hash: &TxHash) -> Result<TxStatus> {
        Ok(self.lock_inner()?.statuses.get(tx_hash).copied().unwrap_or(TxStatus::Unknown))
    }
}
