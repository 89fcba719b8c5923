//! System-wide constants for the swap service.

/// Shannons per CKB (10^8).
pub const SHANNONS_PER_CKB: u64 = 100_000_000;

/// Extra capacity reserved on top of a bid to cover the not yet known fee (1 CKB).
///
/// Also the headroom an assembled batch must keep above the funded cells.
pub const FEE_MARGIN_SHANNONS: u64 = SHANNONS_PER_CKB;

/// Bytes of the capacity field counted by occupied capacity.
pub const CAPACITY_FIELD_SIZE: u64 = 8;

/// ckbhash output size in bytes.
pub const HASH_SIZE: usize = 32;

/// blake160 (truncated ckbhash) size in bytes; also the pubkey-hash size in lock args.
pub const BLAKE160_SIZE: usize = 20;

/// Recoverable secp256k1 signature size (64 compact bytes + recovery id).
pub const SIGNATURE_SIZE: usize = 65;

/// Bytes of cell data holding a UDT amount (u128 little endian).
pub const UDT_AMOUNT_SIZE: usize = 16;

/// Personalization of the blake2b-256 hash used on chain.
pub const CKB_HASH_PERSONALIZATION: &[u8; 16] = b"ckb-default-hash";

/// Version byte leading the multisig structure.
pub const MULTISIG_VERSION: u8 = 0;

/// Maximum number of signers a multisig structure can describe.
pub const MULTISIG_MAX_SIGNERS: usize = 255;

/// Fraction digits carried by prices; also the asset scale of the quoted UDT.
pub const PRICE_DECIMALS: u32 = 6;

/// Minimum fee rate in shannons per 1000 bytes accepted by the node.
pub const MIN_FEE_RATE: u64 = 1_000;

/// Serialized-size overhead of a transaction inside a block (its offset slot).
pub const TX_SIZE_IN_BLOCK_OVERHEAD: usize = 4;

/// Maximum number of dust cells consolidated in one assembler transaction.
pub const ASSEMBLE_BATCH: usize = 50;

/// Page size for indexer cell searches.
pub const FIND_CELLS_PAGE_LIMIT: u32 = 100;

/// Maximum seconds to wait for a storage mutex before failing the operation.
pub const STORAGE_LOCK_TIMEOUT_SECS: u64 = 5;

/// Environment variable overriding the wall clock in tests (unix seconds).
pub const TEST_NOW_SECS_ENV_VAR: &str = "SWAP_TEST_NOW_SECS";

/// Maximum JSON-RPC request body size (1 MB).
pub const MAX_RPC_BODY_BYTES: usize = 1024 * 1024;
