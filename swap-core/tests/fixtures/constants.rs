#![allow(dead_code)]

use swap_core::foundation::SHANNONS_PER_CKB;

pub const CKB: u64 = SHANNONS_PER_CKB;
/// One whole asset unit on the six-digit scale.
pub const UNIT: u128 = 1_000_000;

pub const TEST_UDT_NAME: &str = "USDI";
pub const TEST_PRICE: &str = "0.01";

pub const FUND_SECRET: [u8; 32] = [0x11; 32];
pub const MULTISIG_SECRETS: [[u8; 32]; 3] = [[0x21; 32], [0x22; 32], [0x23; 32]];

pub const SECP_CODE_HASH: [u8; 32] = [0x9b; 32];
pub const MULTISIG_CODE_HASH: [u8; 32] = [0x5c; 32];
pub const UDT_CODE_HASH: [u8; 32] = [0x5e; 32];
pub const UDT_ARGS: [u8; 32] = [0x22; 32];
pub const CALLER_LOCK_ARGS: [u8; 20] = [0xca; 20];
