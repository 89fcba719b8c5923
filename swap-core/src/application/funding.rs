//! The service's own funding lock, derived from the `fund_pool` config section.

use crate::domain::ledger::signature::secret_key_hash;
use crate::domain::ledger::{CellDep, Script};
use crate::domain::multisig::{multisig_args, witness_lock_placeholder, MultisigConfig, MultisigConfigInput};
use crate::foundation::util::encoding::parse_hex_32bytes;
use crate::foundation::{Result, SwapError, SIGNATURE_SIZE};
use crate::infrastructure::chain::{KnownScript, ScriptRegistry};
use crate::infrastructure::config::{AppConfig, FundPoolConfig, FundPoolMode};
use secp256k1::SecretKey;
use std::path::Path;

/// Lock, deps and witness placeholder of the cells the service trades from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FundPool {
    pub mode: FundPoolMode,
    pub lock: Script,
    pub cell_deps: Vec<CellDep>,
    /// Lock bytes written into the first funding witness before signing.
    pub witness_placeholder: Vec<u8>,
    pub multisig: Option<MultisigConfig>,
}

impl FundPool {
    pub fn singlesig(secret: &SecretKey, scripts: &ScriptRegistry) -> Result<Self> {
        let info = scripts.get(KnownScript::Secp256k1Blake160)?;
        Ok(Self {
            mode: FundPoolMode::Singlesig,
            lock: info.script(secret_key_hash(secret).to_vec()),
            cell_deps: info.cell_deps,
            witness_placeholder: vec![0u8; SIGNATURE_SIZE],
            multisig: None,
        })
    }

    pub fn multisig(config: MultisigConfig, scripts: &ScriptRegistry) -> Result<Self> {
        let info = scripts.get(KnownScript::Secp256k1Multisig)?;
        Ok(Self {
            mode: FundPoolMode::Multisig,
            lock: info.script(multisig_args(&config).to_vec()),
            cell_deps: info.cell_deps,
            witness_placeholder: witness_lock_placeholder(&config),
            multisig: Some(config),
        })
    }

    pub fn from_config(config: &AppConfig, scripts: &ScriptRegistry) -> Result<Self> {
        match config.fund_pool.mode {
            FundPoolMode::Singlesig => Self::singlesig(&fund_pool_secret(&config.fund_pool)?, scripts),
            FundPoolMode::Multisig => Self::multisig(load_multisig_config(&config.fund_pool)?, scripts),
        }
    }
}

pub fn parse_secret_key(value: &str) -> Result<SecretKey> {
    let bytes = parse_hex_32bytes(value.trim())?;
    SecretKey::from_slice(&bytes).map_err(|err| SwapError::ConfigError(format!("invalid fund_pool.private_key: {err}")))
}

pub fn fund_pool_secret(config: &FundPoolConfig) -> Result<SecretKey> {
    let key = config.private_key.as_deref().ok_or_else(|| SwapError::ConfigError("fund_pool.private_key is not set".to_string()))?;
    parse_secret_key(key)
}

/// Inline `fund_pool.multisig` wins over `fund_pool.multisig_config_file`.
pub fn load_multisig_config(config: &FundPoolConfig) -> Result<MultisigConfig> {
    if let Some(input) = config.multisig.as_ref() {
        return MultisigConfig::parse(input);
    }
    let path = config
        .multisig_config_file
        .as_deref()
        .ok_or_else(|| SwapError::ConfigError("multisig mode needs fund_pool.multisig or fund_pool.multisig_config_file".to_string()))?;
    read_multisig_file(Path::new(path))
}

fn read_multisig_file(path: &Path) -> Result<MultisigConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| SwapError::ConfigError(format!("failed to read multisig config {}: {err}", path.display())))?;
    let input: MultisigConfigInput = serde_json::from_str(&raw)?;
    MultisigConfig::parse(&input)
}
