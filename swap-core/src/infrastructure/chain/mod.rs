//! Chain access: the node queries the swap flows and workers depend on.

pub mod http;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use http::HttpChainClient;
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockChain;

use crate::domain::ledger::fee::effective_fee_rate;
use crate::domain::ledger::{Cell, CellDep, HashType, OutPoint, Script, Transaction};
use crate::foundation::{Byte32, Result, SwapError, TxHash, FIND_CELLS_PAGE_LIMIT};
use crate::infrastructure::config::{KnownScriptConfig, ScriptsConfig};
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KnownScript {
    Secp256k1Blake160,
    Secp256k1Multisig,
}

impl KnownScript {
    pub fn as_str(self) -> &'static str {
        match self {
            KnownScript::Secp256k1Blake160 => "secp256k1_blake160",
            KnownScript::Secp256k1Multisig => "secp256k1_multisig",
        }
    }
}

/// Code hash and deps of a deployed script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptInfo {
    pub code_hash: Byte32,
    pub hash_type: HashType,
    pub cell_deps: Vec<CellDep>,
}

impl ScriptInfo {
    pub fn script(&self, args: Vec<u8>) -> Script {
        Script::new(self.code_hash, self.hash_type, args)
    }

    fn from_config(config: &KnownScriptConfig) -> Result<Self> {
        let code_hash = config.code_hash.parse().map_err(|err| SwapError::ConfigError(format!("invalid known script code_hash: {err}")))?;
        let cell_deps = config.cell_deps.iter().map(|dep| dep.to_cell_dep()).collect::<Result<Vec<_>>>()?;
        Ok(Self { code_hash, hash_type: config.hash_type, cell_deps })
    }
}

/// Known scripts resolved from the `scripts` config section.
#[derive(Clone, Debug, Default)]
pub struct ScriptRegistry {
    scripts: HashMap<KnownScript, ScriptInfo>,
}

impl ScriptRegistry {
    pub fn from_config(config: &ScriptsConfig) -> Result<Self> {
        let mut registry = Self::default();
        if let Some(script) = config.secp256k1_blake160.as_ref() {
            registry.insert(KnownScript::Secp256k1Blake160, ScriptInfo::from_config(script)?);
        }
        if let Some(script) = config.secp256k1_multisig.as_ref() {
            registry.insert(KnownScript::Secp256k1Multisig, ScriptInfo::from_config(script)?);
        }
        Ok(registry)
    }

    pub fn insert(&mut self, script: KnownScript, info: ScriptInfo) {
        self.scripts.insert(script, info);
    }

    pub fn get(&self, script: KnownScript) -> Result<ScriptInfo> {
        self.scripts
            .get(&script)
            .cloned()
            .ok_or_else(|| SwapError::ConfigError(format!("known script {} is not configured", script.as_str())))
    }
}

/// Indexer search: cells under `lock`, optionally narrowed by type script and length ranges.
///
/// Ranges are half-open `[start, end)`; `type_len_range` measures the serialized type script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellQuery {
    pub lock: Script,
    pub type_script: Option<Script>,
    pub type_len_range: Option<(u64, u64)>,
    pub data_len_range: Option<(u64, u64)>,
}

impl CellQuery {
    pub fn by_lock(lock: Script) -> Self {
        Self { lock, type_script: None, type_len_range: None, data_len_range: None }
    }

    pub fn with_type(mut self, type_script: Script) -> Self {
        self.type_script = Some(type_script);
        self
    }

    /// Only cells without a type script and without data.
    pub fn plain(mut self) -> Self {
        self.type_len_range = Some((0, 1));
        self.data_len_range = Some((0, 1));
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct CellPage {
    pub cells: Vec<Cell>,
    /// Resume point for the next page; `None` after the last page.
    pub cursor: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxStatus {
    Pending,
    Proposed,
    Committed,
    Rejected,
    Unknown,
}

impl TxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TxStatus::Pending => "pending",
            TxStatus::Proposed => "proposed",
            TxStatus::Committed => "committed",
            TxStatus::Rejected => "rejected",
            TxStatus::Unknown => "unknown",
        }
    }
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    fn known_script(&self, script: KnownScript) -> Result<ScriptInfo>;

    /// The cell at `out_point` with its data, or `None` when it is not live.
    async fn get_live_cell(&self, out_point: &OutPoint) -> Result<Option<Cell>>;

    async fn find_cells(&self, query: &CellQuery, cursor: Option<String>, limit: u32) -> Result<CellPage>;

    /// Median fee rate (shannons/KB) of recent blocks, if the node has statistics.
    async fn fee_rate_statistics(&self) -> Result<Option<u64>>;

    async fn send_transaction(&self, tx: &Transaction) -> Result<TxHash>;

    async fn get_transaction_status(&self, tx_hash: &TxHash) -> Result<TxStatus>;
}

/// Pages through `find_cells` until the indexer is exhausted.
pub async fn collect_cells(client: &dyn ChainClient, query: &CellQuery) -> Result<Vec<Cell>> {
    let mut cells = Vec::new();
    let mut cursor = None;
    loop {
        let page = client.find_cells(query, cursor, FIND_CELLS_PAGE_LIMIT).await?;
        cells.extend(page.cells);
        match page.cursor {
            Some(next) => cursor = Some(next),
            None => return Ok(cells),
        }
    }
}

/// Live cells behind every input of `tx`, in input order.
pub async fn resolve_inputs(client: &dyn ChainClient, tx: &Transaction) -> Result<Vec<Cell>> {
    let mut cells = Vec::with_capacity(tx.inputs.len());
    for input in &tx.inputs {
        let cell = client
            .get_live_cell(&input.previous_output)
            .await?
            .ok_or_else(|| SwapError::invalid_input(format!("input {} is not a live cell", input.previous_output)))?;
        cells.push(cell);
    }
    Ok(cells)
}

pub async fn current_fee_rate(client: &dyn ChainClient) -> Result<u64> {
    Ok(effective_fee_rate(client.fee_rate_statistics().await?))
}
