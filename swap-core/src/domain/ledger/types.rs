use crate::domain::ledger::{hash, molecule};
use crate::foundation::{Byte32, Result, SwapError, TxHash, CAPACITY_FIELD_SIZE, SHANNONS_PER_CKB};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a cell: the transaction that created it and the output index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    pub tx_hash: TxHash,
    pub index: u32,
}

impl OutPoint {
    pub const SERIALIZED_SIZE: usize = 36;

    pub fn new(tx_hash: TxHash, index: u32) -> Self {
        Self { tx_hash, index }
    }

    /// Molecule bytes: tx hash followed by the little-endian index.
    pub fn to_bytes(&self) -> [u8; Self::SERIALIZED_SIZE] {
        let mut out = [0u8; Self::SERIALIZED_SIZE];
        out[..32].copy_from_slice(self.tx_hash.as_ref());
        out[32..].copy_from_slice(&self.index.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::SERIALIZED_SIZE {
            return Err(SwapError::EncodingError(format!("out point must be {} bytes, got {}", Self::SERIALIZED_SIZE, bytes.len())));
        }
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&bytes[..32]);
        let mut index = [0u8; 4];
        index.copy_from_slice(&bytes[32..]);
        Ok(Self { tx_hash: TxHash::new(hash), index: u32::from_le_bytes(index) })
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_hash, self.index)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashType {
    #[default]
    Data,
    Type,
    Data1,
    Data2,
}

impl HashType {
    pub fn to_byte(self) -> u8 {
        match self {
            HashType::Data => 0,
            HashType::Type => 1,
            HashType::Data1 => 2,
            HashType::Data2 => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HashType::Data => "data",
            HashType::Type => "type",
            HashType::Data1 => "data1",
            HashType::Data2 => "data2",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Script {
    pub code_hash: Byte32,
    pub hash_type: HashType,
    pub args: Vec<u8>,
}

impl Script {
    pub fn new(code_hash: Byte32, hash_type: HashType, args: Vec<u8>) -> Self {
        Self { code_hash, hash_type, args }
    }

    /// Bytes counted by occupied capacity: code hash, hash type byte and args.
    pub fn occupied_bytes(&self) -> u64 {
        32 + 1 + self.args.len() as u64
    }

    pub fn hash(&self) -> Byte32 {
        Byte32::new(hash::ckbhash(&molecule::script(self)))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepType {
    #[default]
    Code,
    DepGroup,
}

impl DepType {
    pub fn to_byte(self) -> u8 {
        match self {
            DepType::Code => 0,
            DepType::DepGroup => 1,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellDep {
    pub out_point: OutPoint,
    pub dep_type: DepType,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellInput {
    pub since: u64,
    pub previous_output: OutPoint,
}

impl CellInput {
    pub fn new(previous_output: OutPoint) -> Self {
        Self { since: 0, previous_output }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellOutput {
    pub capacity: u64,
    pub lock: Script,
    pub type_: Option<Script>,
}

impl CellOutput {
    /// Minimum capacity (in shannons) a cell with this output and `data_len` bytes of data must hold.
    pub fn occupied_capacity(&self, data_len: usize) -> u64 {
        let bytes = CAPACITY_FIELD_SIZE
            + self.lock.occupied_bytes()
            + self.type_.as_ref().map(Script::occupied_bytes).unwrap_or(0)
            + data_len as u64;
        bytes.saturating_mul(SHANNONS_PER_CKB)
    }
}

/// A live cell as observed on chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub out_point: OutPoint,
    pub output: CellOutput,
    pub data: Vec<u8>,
}

impl Cell {
    pub fn occupied_capacity(&self) -> u64 {
        self.output.occupied_capacity(self.data.len())
    }

    /// Capacity that can be moved out of the cell while keeping it valid.
    pub fn free_capacity(&self) -> u64 {
        self.output.capacity.saturating_sub(self.occupied_capacity())
    }

    pub fn is_plain(&self) -> bool {
        self.output.type_.is_none() && self.data.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub cell_deps: Vec<CellDep>,
    pub header_deps: Vec<Byte32>,
    pub inputs: Vec<CellInput>,
    pub outputs: Vec<CellOutput>,
    pub outputs_data: Vec<Vec<u8>>,
    pub witnesses: Vec<Vec<u8>>,
}

impl Transaction {
    /// Content hash; excludes witnesses.
    pub fn hash(&self) -> TxHash {
        TxHash::new(hash::ckbhash(&molecule::raw_transaction(self)))
    }

    pub fn serialized_size(&self) -> usize {
        molecule::transaction(self).len()
    }

    pub fn outputs_capacity(&self) -> Result<u64> {
        self.outputs.iter().try_fold(0u64, |acc, output| {
            acc.checked_add(output.capacity).ok_or_else(|| SwapError::invalid_input("output capacity overflow"))
        })
    }

    pub fn add_cell_dep(&mut self, dep: CellDep) {
        if !self.cell_deps.contains(&dep) {
            self.cell_deps.push(dep);
        }
    }

    pub fn add_output(&mut self, output: CellOutput, data: Vec<u8>) {
        self.outputs.push(output);
        self.outputs_data.push(data);
    }

    /// Ensures `outputs_data` has one entry per output.
    pub fn normalize_outputs_data(&mut self) {
        self.outputs_data.resize(self.outputs.len(), Vec::new());
    }

    pub fn witness_args(&self, index: usize) -> Result<Option<WitnessArgs>> {
        match self.witnesses.get(index) {
            None => Ok(None),
            Some(bytes) if bytes.is_empty() => Ok(None),
            Some(bytes) => molecule::decode_witness_args(bytes).map(Some),
        }
    }

    pub fn set_witness_args(&mut self, index: usize, args: &WitnessArgs) {
        if self.witnesses.len() <= index {
            self.witnesses.resize(index + 1, Vec::new());
        }
        self.witnesses[index] = molecule::witness_args(args);
    }
}

/// Standard witness layout: lock proof plus optional type-script payloads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WitnessArgs {
    pub lock: Option<Vec<u8>>,
    pub input_type: Option<Vec<u8>>,
    pub output_type: Option<Vec<u8>>,
}

impl WitnessArgs {
    pub fn with_lock(lock: Vec<u8>) -> Self {
        Self { lock: Some(lock), ..Self::default() }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        molecule::witness_args(self)
    }
}
