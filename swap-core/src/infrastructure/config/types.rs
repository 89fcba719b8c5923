use crate::domain::ledger::{CellDep, DepType, HashType, OutPoint, Script};
use crate::domain::multisig::MultisigConfigInput;
use crate::foundation::util::encoding::decode_hex;
use crate::foundation::{Byte32, Result, SwapError, TxHash};
use figment::value::{Dict, Map};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Custody mode of the funding cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundPoolMode {
    /// Cells locked by secp256k1/blake160 under `fund_pool.private_key`.
    #[default]
    #[serde(alias = "single")]
    Singlesig,
    /// Cells locked by the r-of-m multisig; signatures come from remote endpoints.
    Multisig,
}

impl std::fmt::Display for FundPoolMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Singlesig => write!(f, "singlesig"),
            Self::Multisig => write!(f, "multisig"),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Network name, informational (mainnet, testnet, devnet).
    #[serde(default)]
    pub network: Option<String>,
    /// CKB node JSON-RPC endpoint; must expose the indexer module.
    #[serde(default)]
    pub node_rpc_url: String,
    #[serde(default)]
    pub data_dir: String,
    /// Devnet-only escape hatch: wipe RocksDB if schema version mismatches.
    #[serde(default)]
    pub allow_schema_wipe: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default)]
    pub addr: String,
    /// Path serving JSON-RPC POSTs.
    #[serde(default)]
    pub path: String,
    /// Optional bearer token required on JSON-RPC calls.
    #[serde(default)]
    pub token: Option<String>,
    /// Log request and response bodies.
    #[serde(default)]
    pub log_request: bool,
    /// Largest accepted request body; defaults to `MAX_RPC_BODY_BYTES`.
    #[serde(default)]
    pub max_body_bytes: Option<usize>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SwapConfig {
    /// Lifetime of a reservation taken by `initiate`.
    #[serde(default)]
    pub locked_seconds: u64,
    /// Lifetime of a reservation committed by `confirm`.
    #[serde(default)]
    pub committing_seconds: u64,
    /// Extra charged on top of the price, in percent.
    #[serde(default)]
    pub incentive_percent: Decimal,
    /// Largest capacity (CKB) a single trade may deliver.
    #[serde(default)]
    pub max_traded_ckb: Decimal,
    /// Capacity (CKB) each freshly assembled asset cell is funded with.
    #[serde(default)]
    pub initial_udt_cell_ckb: Decimal,
    /// Asset cells below this capacity (CKB) are dust.
    #[serde(default)]
    pub min_udt_cell_ckb: Decimal,
    /// Upper bound for `confirm` waiting on the signing worker; defaults to `committing_seconds`.
    #[serde(default)]
    pub sign_timeout_secs: Option<u64>,
    #[serde(default)]
    pub sign_poll_initial_ms: u64,
    #[serde(default)]
    pub sign_poll_max_ms: u64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PriceConfig {
    /// `custom` (price written externally), `fixed:<decimal>` or a bare decimal.
    #[serde(default)]
    pub strategy: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FundPoolConfig {
    #[serde(default)]
    pub mode: FundPoolMode,
    /// Hex secp256k1 secret key. Signs funding inputs in singlesig mode and answers `sign` in
    /// multisig-signer mode.
    #[serde(default, skip_serializing)]
    pub private_key: Option<String>,
    /// Lock that receives asset above `workers.udt_collection_cap`; its inputs are never traded.
    #[serde(default)]
    pub collection_lock: Option<ScriptConfig>,
    /// Inline multisig description.
    #[serde(default)]
    pub multisig: Option<MultisigConfigInput>,
    /// JSON file with the multisig description; used when `multisig` is absent.
    #[serde(default)]
    pub multisig_config_file: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WorkersConfig {
    #[serde(default)]
    pub refresher_interval_secs: u64,
    #[serde(default)]
    pub assembler_interval_secs: u64,
    /// Asset (whole units) one assembled transaction keeps in the pool before diverting to the
    /// collection lock.
    #[serde(default)]
    pub udt_collection_cap: Option<Decimal>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UdtConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub script: Option<ScriptConfig>,
    #[serde(default)]
    pub cell_deps: Vec<CellDepConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptConfig {
    pub code_hash: String,
    #[serde(default)]
    pub hash_type: HashType,
    #[serde(default)]
    pub args: String,
}

impl ScriptConfig {
    pub fn to_script(&self) -> Result<Script> {
        let code_hash: Byte32 = self.code_hash.parse().map_err(|err| SwapError::ConfigError(format!("invalid code_hash: {err}")))?;
        let args = decode_hex(&self.args).map_err(|err| SwapError::ConfigError(format!("invalid script args: {err}")))?;
        Ok(Script::new(code_hash, self.hash_type, args))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellDepConfig {
    pub tx_hash: String,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub dep_type: DepType,
}

impl CellDepConfig {
    pub fn to_cell_dep(&self) -> Result<CellDep> {
        let tx_hash: TxHash = self.tx_hash.parse().map_err(|err| SwapError::ConfigError(format!("invalid cell dep tx_hash: {err}")))?;
        Ok(CellDep { out_point: OutPoint::new(tx_hash, self.index), dep_type: self.dep_type })
    }
}

/// Code hash and dependencies of a script deployed on the target chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownScriptConfig {
    pub code_hash: String,
    #[serde(default)]
    pub hash_type: HashType,
    #[serde(default)]
    pub cell_deps: Vec<CellDepConfig>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ScriptsConfig {
    #[serde(default)]
    pub secp256k1_blake160: Option<KnownScriptConfig>,
    #[serde(default)]
    pub secp256k1_multisig: Option<KnownScriptConfig>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub swap: SwapConfig,
    #[serde(default)]
    pub price: PriceConfig,
    #[serde(default)]
    pub fund_pool: FundPoolConfig,
    #[serde(default)]
    pub workers: WorkersConfig,
    #[serde(default)]
    pub udt: UdtConfig,
    #[serde(default)]
    pub scripts: ScriptsConfig,

    /// Profile overrides (e.g. `profiles.signer-1.*`) - used by the loader.
    #[serde(default, skip_serializing)]
    pub profiles: Option<Map<String, Dict>>,
}
