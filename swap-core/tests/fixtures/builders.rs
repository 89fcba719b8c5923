#![allow(dead_code)]

use crate::fixtures::constants::*;
use swap_core::domain::ledger::udt::encode_udt_amount;
use swap_core::domain::ledger::{Cell, CellDep, CellInput, CellOutput, DepType, HashType, OutPoint, Script, Transaction, WitnessArgs};
use swap_core::foundation::{Byte32, TxHash, SIGNATURE_SIZE};
use swap_core::infrastructure::chain::{KnownScript, ScriptInfo, ScriptRegistry};

pub fn out_point(n: u8) -> OutPoint {
    OutPoint::new(TxHash::new([n; 32]), u32::from(n))
}

pub fn udt_script() -> Script {
    Script::new(Byte32::new(UDT_CODE_HASH), HashType::Type, UDT_ARGS.to_vec())
}

pub fn caller_lock() -> Script {
    Script::new(Byte32::new(SECP_CODE_HASH), HashType::Type, CALLER_LOCK_ARGS.to_vec())
}

pub fn registry() -> ScriptRegistry {
    let dep = |byte| CellDep { out_point: OutPoint::new(TxHash::new([byte; 32]), 0), dep_type: DepType::DepGroup };
    let mut registry = ScriptRegistry::default();
    registry.insert(
        KnownScript::Secp256k1Blake160,
        ScriptInfo { code_hash: Byte32::new(SECP_CODE_HASH), hash_type: HashType::Type, cell_deps: vec![dep(0xd1)] },
    );
    registry.insert(
        KnownScript::Secp256k1Multisig,
        ScriptInfo { code_hash: Byte32::new(MULTISIG_CODE_HASH), hash_type: HashType::Type, cell_deps: vec![dep(0xd2)] },
    );
    registry
}

pub fn asset_cell(n: u8, lock: Script, capacity: u64, amount: u128) -> Cell {
    Cell { out_point: out_point(n), output: CellOutput { capacity, lock, type_: Some(udt_script()) }, data: encode_udt_amount(amount) }
}

pub fn plain_cell(n: u8, lock: Script, capacity: u64) -> Cell {
    Cell { out_point: out_point(n), output: CellOutput { capacity, lock, type_: None }, data: Vec::new() }
}

/// Caller side of a trade: spends `inputs`, receives `output_capacity` in one asset cell holding `asset`.
pub struct TradeBuilder {
    inputs: Vec<OutPoint>,
    output_capacity: u64,
    asset: u128,
}

impl TradeBuilder {
    pub fn new(output_capacity: u64, asset: u128) -> Self {
        Self { inputs: Vec::new(), output_capacity, asset }
    }

    pub fn input(mut self, cell: &Cell) -> Self {
        self.inputs.push(cell.out_point);
        self
    }

    pub fn build(self) -> Transaction {
        let mut tx = Transaction::default();
        for input in &self.inputs {
            tx.inputs.push(CellInput::new(*input));
        }
        tx.add_output(
            CellOutput { capacity: self.output_capacity, lock: caller_lock(), type_: Some(udt_script()) },
            encode_udt_amount(self.asset),
        );
        for index in 0..tx.inputs.len() {
            tx.set_witness_args(index, &WitnessArgs::with_lock(vec![0u8; SIGNATURE_SIZE]));
        }
        tx
    }
}
