use crate::foundation::util::encoding::decode_hex;
use crate::foundation::{Result, SwapError, BLAKE160_SIZE, MULTISIG_MAX_SIGNERS};
use serde::{Deserialize, Serialize};

/// Unvalidated multisig description as written in config files.
///
/// `r` and `m` are kept as signed integers so that negative values are reported as
/// configuration errors instead of failing deserialization with an opaque message.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MultisigConfigInput {
    pub r: i64,
    pub m: i64,
    /// blake160 hashes of the signer public keys, hex encoded.
    pub pubkeys: Vec<String>,
    pub endpoints: Vec<String>,
}

/// Validated r-of-m description. The first `r` signers are required.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultisigConfig {
    r: u8,
    m: u8,
    pubkey_hashes: Vec<[u8; BLAKE160_SIZE]>,
    endpoints: Vec<String>,
}

impl MultisigConfig {
    pub fn parse(input: &MultisigConfigInput) -> Result<Self> {
        let mut pubkey_hashes = Vec::with_capacity(input.pubkeys.len());
        for pubkey in &input.pubkeys {
            let bytes = decode_hex(pubkey).map_err(|err| SwapError::InvalidMultisigConfig(err.to_string()))?;
            let hash: [u8; BLAKE160_SIZE] = bytes.as_slice().try_into().map_err(|_| {
                SwapError::InvalidMultisigConfig(format!("invalid pubkey length: {}, expected {}", bytes.len(), BLAKE160_SIZE))
            })?;
            pubkey_hashes.push(hash);
        }
        Self::new(input.r, input.m, pubkey_hashes, input.endpoints.clone())
    }

    pub fn new(r: i64, m: i64, pubkey_hashes: Vec<[u8; BLAKE160_SIZE]>, endpoints: Vec<String>) -> Result<Self> {
        let n = pubkey_hashes.len();
        if n > MULTISIG_MAX_SIGNERS {
            return Err(SwapError::InvalidMultisigConfig(format!(
                "a maximum of {} pubkeys are allowed, actual: {}",
                MULTISIG_MAX_SIGNERS, n
            )));
        }
        if endpoints.len() != n {
            return Err(SwapError::InvalidMultisigConfig(format!(
                "the number of endpoints must match the number of pubkeys: {} != {}",
                endpoints.len(),
                n
            )));
        }
        if r < 0 || r > n as i64 {
            return Err(SwapError::InvalidMultisigConfig(format!("invalid r: {}", r)));
        }
        if m <= 0 || m > n as i64 {
            return Err(SwapError::InvalidMultisigConfig(format!("invalid m: {}", m)));
        }
        if r > m {
            return Err(SwapError::InvalidMultisigConfig(format!("r({}) cannot be bigger than m({})", r, m)));
        }
        // n <= 255 bounds both r and m.
        Ok(Self { r: r as u8, m: m as u8, pubkey_hashes, endpoints })
    }

    pub fn required(&self) -> u8 {
        self.r
    }

    pub fn threshold(&self) -> u8 {
        self.m
    }

    pub fn signer_count(&self) -> usize {
        self.pubkey_hashes.len()
    }

    pub fn pubkey_hashes(&self) -> &[[u8; BLAKE160_SIZE]] {
        &self.pubkey_hashes
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn to_input(&self) -> MultisigConfigInput {
        MultisigConfigInput {
            r: i64::from(self.r),
            m: i64::from(self.m),
            pubkeys: self.pubkey_hashes.iter().map(|hash| format!("0x{}", hex::encode(hash))).collect(),
            endpoints: self.endpoints.clone(),
        }
    }
}
