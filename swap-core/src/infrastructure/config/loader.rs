//! Configuration loader using Figment for layered config management.
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. TOML config file
//! 3. Profile overrides from `[profiles.<name>]`
//! 4. Environment variables (SWAP_* prefix)

use crate::foundation::SwapError;
use crate::infrastructure::config::types::AppConfig;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::value::Dict;
use figment::{Figment, Profile};
use rust_decimal::Decimal;
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_NODE_RPC_URL: &str = "http://127.0.0.1:8114";
const DEFAULT_RPC_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_RPC_PATH: &str = "/rpc";
const DEFAULT_LOCKED_SECONDS: u64 = 60;
const DEFAULT_COMMITTING_SECONDS: u64 = 120;
const DEFAULT_MAX_TRADED_CKB: u64 = 100_000;
const DEFAULT_INITIAL_UDT_CELL_CKB: u64 = 1_000;
const DEFAULT_MIN_UDT_CELL_CKB: u64 = 500;
const DEFAULT_SIGN_POLL_INITIAL_MS: u64 = 100;
const DEFAULT_SIGN_POLL_MAX_MS: u64 = 2_000;
const DEFAULT_REFRESHER_INTERVAL_SECS: u64 = 10;
const DEFAULT_ASSEMBLER_INTERVAL_SECS: u64 = 60;
const DEFAULT_PRICE_STRATEGY: &str = "custom";

/// Environment variable prefix for config overrides.
///
/// Example: `SWAP_SWAP__LOCKED_SECONDS` -> `swap.locked_seconds`
const ENV_PREFIX: &str = "SWAP_";

pub const CONFIG_FILE_NAME: &str = "swap-config.toml";

/// Load configuration from the default file in `data_dir` (`swap-config.toml`).
pub fn load_config(data_dir: &Path) -> Result<AppConfig, SwapError> {
    let config_path = data_dir.join(CONFIG_FILE_NAME);
    load_config_from_file(&config_path, data_dir)
}

/// Load configuration from a specific file path.
pub fn load_config_from_file(path: &Path, data_dir: &Path) -> Result<AppConfig, SwapError> {
    info!(path = %path.display(), data_dir = %data_dir.display(), "loading configuration");
    let figment = figment_base(path).merge(Env::prefixed(ENV_PREFIX).split("__"));
    let mut config: AppConfig = figment.extract().map_err(|e| SwapError::ConfigError(format!("config extraction failed: {e}")))?;
    postprocess(&mut config, data_dir);
    debug!(
        node_rpc_url = %redact_url(&config.service.node_rpc_url),
        rpc_addr = %config.rpc.addr,
        fund_pool_mode = %config.fund_pool.mode,
        "configuration loaded"
    );
    Ok(config)
}

/// Load configuration from a specific file path with profile overrides.
pub fn load_config_from_file_with_profile(path: &Path, data_dir: &Path, profile: &str) -> Result<AppConfig, SwapError> {
    info!(path = %path.display(), data_dir = %data_dir.display(), profile = %profile, "loading configuration with profile");

    // Extract once to access `profiles.<name>` overrides from the file.
    let base_config: AppConfig =
        figment_base(path).extract().map_err(|e| SwapError::ConfigError(format!("config extraction failed: {e}")))?;
    let overrides = profile_overrides(&base_config, profile)?;

    let figment = figment_base(path).merge(Serialized::from(overrides, Profile::Default)).merge(Env::prefixed(ENV_PREFIX).split("__"));
    let mut config: AppConfig =
        figment.extract().map_err(|e| SwapError::ConfigError(format!("config extraction failed for profile '{profile}': {e}")))?;
    postprocess(&mut config, data_dir);

    debug!(
        profile = %profile,
        node_rpc_url = %redact_url(&config.service.node_rpc_url),
        rpc_addr = %config.rpc.addr,
        "configuration loaded with profile"
    );
    Ok(config)
}

fn figment_base(path: &Path) -> Figment {
    let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));
    if path.exists() {
        figment = figment.merge(Toml::file(path));
    } else {
        debug!(path = %path.display(), "configuration file missing; using defaults and env only");
    }
    figment
}

fn profile_overrides(config: &AppConfig, profile: &str) -> Result<Dict, SwapError> {
    let profiles = config.profiles.as_ref().ok_or_else(|| SwapError::ConfigError("no profiles section in config".to_string()))?;
    profiles.get(profile).cloned().ok_or_else(|| SwapError::ConfigError(format!("profile '{profile}' not found in config")))
}

fn postprocess(config: &mut AppConfig, data_dir: &Path) {
    if config.service.data_dir.trim().is_empty() {
        config.service.data_dir = data_dir.to_string_lossy().to_string();
    }
    if config.service.node_rpc_url.trim().is_empty() {
        config.service.node_rpc_url = DEFAULT_NODE_RPC_URL.to_string();
    }
    if config.rpc.addr.trim().is_empty() {
        config.rpc.addr = DEFAULT_RPC_ADDR.to_string();
    }
    if config.rpc.path.trim().is_empty() {
        config.rpc.path = DEFAULT_RPC_PATH.to_string();
    }
    if config.rpc.token.as_deref().is_some_and(|token| token.trim().is_empty()) {
        config.rpc.token = None;
    }

    let swap = &mut config.swap;
    if swap.locked_seconds == 0 {
        swap.locked_seconds = DEFAULT_LOCKED_SECONDS;
    }
    if swap.committing_seconds == 0 {
        swap.committing_seconds = DEFAULT_COMMITTING_SECONDS;
    }
    if swap.max_traded_ckb.is_zero() {
        swap.max_traded_ckb = Decimal::from(DEFAULT_MAX_TRADED_CKB);
    }
    if swap.initial_udt_cell_ckb.is_zero() {
        swap.initial_udt_cell_ckb = Decimal::from(DEFAULT_INITIAL_UDT_CELL_CKB);
    }
    if swap.min_udt_cell_ckb.is_zero() {
        swap.min_udt_cell_ckb = Decimal::from(DEFAULT_MIN_UDT_CELL_CKB);
    }
    if swap.sign_timeout_secs.is_none() {
        swap.sign_timeout_secs = Some(swap.committing_seconds);
    }
    if swap.sign_poll_initial_ms == 0 {
        swap.sign_poll_initial_ms = DEFAULT_SIGN_POLL_INITIAL_MS;
    }
    if swap.sign_poll_max_ms == 0 {
        swap.sign_poll_max_ms = DEFAULT_SIGN_POLL_MAX_MS;
    }

    if config.price.strategy.trim().is_empty() {
        config.price.strategy = DEFAULT_PRICE_STRATEGY.to_string();
    }
    if config.workers.refresher_interval_secs == 0 {
        config.workers.refresher_interval_secs = DEFAULT_REFRESHER_INTERVAL_SECS;
    }
    if config.workers.assembler_interval_secs == 0 {
        config.workers.assembler_interval_secs = DEFAULT_ASSEMBLER_INTERVAL_SECS;
    }
}

pub(crate) fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let (scheme, rest) = url.split_at(scheme_end + 3);
    let Some(at) = rest.find('@') else {
        return url.to_string();
    };
    format!("{scheme}<redacted>@{}", &rest[at + 1..])
}
