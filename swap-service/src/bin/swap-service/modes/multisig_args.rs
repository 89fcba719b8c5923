use serde::Serialize;
use swap_core::application::funding::load_multisig_config;
use swap_core::domain::multisig::{multisig_args, multisig_script, witness_lock_placeholder};
use swap_core::foundation::SwapError;
use swap_core::infrastructure::config::AppConfig;

#[derive(Serialize)]
struct MultisigReport {
    required: u8,
    threshold: u8,
    signers: usize,
    multisig_script: String,
    lock_args: String,
    /// Present when `scripts.secp256k1_multisig` is configured.
    lock_code_hash: Option<String>,
    witness_lock_placeholder_len: usize,
    endpoints: Vec<String>,
}

/// Prints what an operator needs to fund the multisig pool.
pub fn print_multisig_args(app_config: &AppConfig) -> Result<(), SwapError> {
    let config = load_multisig_config(&app_config.fund_pool)?;
    let report = MultisigReport {
        required: config.required(),
        threshold: config.threshold(),
        signers: config.signer_count(),
        multisig_script: format!("0x{}", hex::encode(multisig_script(&config))),
        lock_args: format!("0x{}", hex::encode(multisig_args(&config))),
        lock_code_hash: app_config.scripts.secp256k1_multisig.as_ref().map(|script| script.code_hash.clone()),
        witness_lock_placeholder_len: witness_lock_placeholder(&config).len(),
        endpoints: config.endpoints().to_vec(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
