//! Consolidation of dust cells into freshly funded asset cells.

use crate::domain::ledger::udt::{encode_udt_amount, udt_amount};
use crate::domain::ledger::{Cell, CellDep, CellInput, CellOutput, Script, Transaction, WitnessArgs};
use crate::foundation::{Result, SwapError, ASSEMBLE_BATCH, FEE_MARGIN_SHANNONS};

#[derive(Clone, Debug)]
pub struct AssemblyParams {
    pub funding_lock: Script,
    pub udt_script: Script,
    /// Capacity each new asset cell is funded with.
    pub initial_capacity: u64,
    /// Asset carried by one assembled transaction above which the excess moves to the collection lock.
    pub collection_cap: Option<u128>,
    pub collection_lock: Option<Script>,
    pub cell_deps: Vec<CellDep>,
    pub witness_lock_placeholder: Vec<u8>,
}

/// Groups dust into batches, largest cells first.
///
/// A batch closes at `ASSEMBLE_BATCH` cells or once it covers `ASSEMBLE_BATCH` new cells plus the
/// fee margin. Batches that cannot fund a single cell plus the margin are dropped.
pub fn plan_batches(mut dust: Vec<Cell>, initial_capacity: u64) -> Vec<Vec<Cell>> {
    dust.sort_by_key(|cell| (cell.output.capacity, cell.out_point));
    let batch_target = (ASSEMBLE_BATCH as u64).saturating_mul(initial_capacity).saturating_add(FEE_MARGIN_SHANNONS);
    let viable = initial_capacity.saturating_add(FEE_MARGIN_SHANNONS);
    let mut batches = Vec::new();
    while !dust.is_empty() {
        let mut batch = Vec::new();
        let mut capacity = 0u64;
        while batch.len() < ASSEMBLE_BATCH && capacity < batch_target {
            let Some(cell) = dust.pop() else { break };
            capacity = capacity.saturating_add(cell.output.capacity);
            batch.push(cell);
        }
        if capacity >= viable {
            batches.push(batch);
        }
    }
    batches
}

/// Builds the consolidation transaction for one batch, before fee.
///
/// Output 0 receives the spare capacity and the carried asset; asset above the collection cap is
/// moved to an extra output under the collection lock.
pub fn build_assembly(batch: &[Cell], params: &AssemblyParams) -> Result<Transaction> {
    if params.initial_capacity == 0 {
        return Err(SwapError::ConfigError("initial asset cell capacity must be positive".to_string()));
    }
    let capacity = batch.iter().try_fold(0u64, |acc, cell| acc.checked_add(cell.output.capacity)).ok_or_else(|| {
        SwapError::Message("dust capacity overflow".to_string())
    })?;
    let funded = capacity.saturating_sub(FEE_MARGIN_SHANNONS);
    let output_count = funded / params.initial_capacity;
    if output_count == 0 {
        return Err(SwapError::Message(format!("batch capacity {} cannot fund an asset cell", capacity)));
    }
    let spare = capacity - output_count * params.initial_capacity;
    let carried: u128 = batch
        .iter()
        .filter(|cell| cell.output.type_.as_ref() == Some(&params.udt_script))
        .map(|cell| udt_amount(&cell.data))
        .fold(0u128, |acc, amount| acc.saturating_add(amount));

    let (kept, collected) = match (params.collection_cap, params.collection_lock.as_ref()) {
        (Some(cap), Some(_)) if carried > cap => (cap, carried - cap),
        _ => (carried, 0),
    };

    let mut tx = Transaction::default();
    for dep in &params.cell_deps {
        tx.add_cell_dep(dep.clone());
    }
    for cell in batch {
        tx.inputs.push(CellInput::new(cell.out_point));
    }
    let template = CellOutput { capacity: params.initial_capacity, lock: params.funding_lock.clone(), type_: Some(params.udt_script.clone()) };
    for index in 0..output_count {
        let amount = if index == 0 { kept } else { 0 };
        tx.add_output(template.clone(), encode_udt_amount(amount));
    }
    tx.outputs[0].capacity += spare;

    if let (true, Some(collection_lock)) = (collected > 0, params.collection_lock.as_ref()) {
        let mut output = CellOutput { capacity: 0, lock: collection_lock.clone(), type_: Some(params.udt_script.clone()) };
        let data = encode_udt_amount(collected);
        output.capacity = output.occupied_capacity(data.len());
        tx.outputs[0].capacity = tx.outputs[0]
            .capacity
            .checked_sub(output.capacity)
            .ok_or_else(|| SwapError::Message("collection output exceeds spare capacity".to_string()))?;
        tx.add_output(output, data);
    }

    tx.set_witness_args(0, &WitnessArgs::with_lock(params.witness_lock_placeholder.clone()));
    tx.witnesses.resize(tx.inputs.len(), Vec::new());
    Ok(tx)
}

/// Takes `fee` from output 0, keeping it above its occupied capacity.
pub fn apply_fee(tx: &mut Transaction, fee: u64) -> Result<()> {
    let data_len = tx.outputs_data.first().map(Vec::len).unwrap_or(0);
    let first = tx.outputs.first_mut().ok_or_else(|| SwapError::Message("transaction has no outputs".to_string()))?;
    let remaining = first.capacity.checked_sub(fee).ok_or_else(|| SwapError::Message("fee exceeds output capacity".to_string()))?;
    if remaining < first.occupied_capacity(data_len) {
        return Err(SwapError::Message(format!("fee {} leaves output 0 below its occupied capacity", fee)));
    }
    first.capacity = remaining;
    Ok(())
}
