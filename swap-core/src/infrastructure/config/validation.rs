use crate::domain::multisig::MultisigConfig;
use crate::domain::pricing::{ckb_to_shannons, incentive_percent};
use crate::infrastructure::config::types::{AppConfig, FundPoolMode};
use crate::infrastructure::price::PriceStrategy;

impl AppConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.rpc.path.starts_with('/') {
            errors.push("rpc.path must start with '/'".to_string());
        }
        if self.rpc.max_body_bytes == Some(0) {
            errors.push("rpc.max_body_bytes must be > 0".to_string());
        }

        if self.swap.locked_seconds == 0 {
            errors.push("swap.locked_seconds must be > 0".to_string());
        }
        if self.swap.committing_seconds == 0 {
            errors.push("swap.committing_seconds must be > 0".to_string());
        }
        if let Some(timeout) = self.swap.sign_timeout_secs {
            if timeout == 0 || timeout > self.swap.committing_seconds {
                errors.push("swap.sign_timeout_secs must be in (0, swap.committing_seconds]".to_string());
            }
        }
        if self.swap.sign_poll_initial_ms > self.swap.sign_poll_max_ms {
            errors.push("swap.sign_poll_initial_ms cannot exceed swap.sign_poll_max_ms".to_string());
        }
        if let Err(err) = incentive_percent(self.swap.incentive_percent) {
            errors.push(err.to_string());
        }
        for (name, value) in [
            ("swap.max_traded_ckb", self.swap.max_traded_ckb),
            ("swap.initial_udt_cell_ckb", self.swap.initial_udt_cell_ckb),
            ("swap.min_udt_cell_ckb", self.swap.min_udt_cell_ckb),
        ] {
            match ckb_to_shannons(value) {
                Ok(0) => errors.push(format!("{name} must be > 0")),
                Ok(_) => {}
                Err(err) => errors.push(format!("{name}: {err}")),
            }
        }
        if self.swap.min_udt_cell_ckb > self.swap.initial_udt_cell_ckb {
            errors.push("swap.min_udt_cell_ckb cannot exceed swap.initial_udt_cell_ckb".to_string());
        }

        if let Err(err) = PriceStrategy::parse(&self.price.strategy) {
            errors.push(err.to_string());
        }

        if self.udt.name.trim().is_empty() {
            errors.push("udt.name is required".to_string());
        }
        match self.udt.script.as_ref() {
            None => errors.push("udt.script is required".to_string()),
            Some(script) => {
                if let Err(err) = script.to_script() {
                    errors.push(format!("udt.script: {err}"));
                }
            }
        }
        for dep in &self.udt.cell_deps {
            if let Err(err) = dep.to_cell_dep() {
                errors.push(format!("udt.cell_deps: {err}"));
            }
        }

        if let Some(lock) = self.fund_pool.collection_lock.as_ref() {
            if let Err(err) = lock.to_script() {
                errors.push(format!("fund_pool.collection_lock: {err}"));
            }
        }
        match self.fund_pool.mode {
            FundPoolMode::Singlesig => {
                if self.fund_pool.private_key.as_deref().map_or(true, |key| key.trim().is_empty()) {
                    errors.push("fund_pool.private_key is required in singlesig mode".to_string());
                }
                if self.scripts.secp256k1_blake160.is_none() {
                    errors.push("scripts.secp256k1_blake160 is required in singlesig mode".to_string());
                }
            }
            FundPoolMode::Multisig => {
                match self.fund_pool.multisig.as_ref() {
                    Some(input) => {
                        if let Err(err) = MultisigConfig::parse(input) {
                            errors.push(format!("fund_pool.multisig: {err}"));
                        }
                    }
                    None if self.fund_pool.multisig_config_file.is_none() => {
                        errors.push("fund_pool.multisig or fund_pool.multisig_config_file is required in multisig mode".to_string());
                    }
                    None => {}
                }
                if self.scripts.secp256k1_multisig.is_none() {
                    errors.push("scripts.secp256k1_multisig is required in multisig mode".to_string());
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
