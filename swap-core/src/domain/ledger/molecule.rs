//! Molecule encoding of the ledger structures that take part in hashing and size estimation.
//!
//! Fixed-size structs are concatenated, `fixvec`s carry an item count, and tables/`dynvec`s
//! carry a full-size header followed by one offset per field.

use crate::domain::ledger::types::{CellDep, CellInput, CellOutput, OutPoint, Script, Transaction, WitnessArgs};
use crate::foundation::{Result, SwapError};

const NUMBER_SIZE: usize = 4;

fn push_u32(out: &mut Vec<u8>, value: usize) {
    out.extend_from_slice(&(value as u32).to_le_bytes());
}

/// `fixvec<byte>`.
pub fn bytes(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(NUMBER_SIZE + data.len());
    push_u32(&mut out, data.len());
    out.extend_from_slice(data);
    out
}

/// Table or `dynvec`: both share the header layout.
fn table(fields: &[Vec<u8>]) -> Vec<u8> {
    let header_size = NUMBER_SIZE * (fields.len() + 1);
    let total = header_size + fields.iter().map(Vec::len).sum::<usize>();
    let mut out = Vec::with_capacity(total);
    push_u32(&mut out, total);
    let mut offset = header_size;
    for field in fields {
        push_u32(&mut out, offset);
        offset += field.len();
    }
    for field in fields {
        out.extend_from_slice(field);
    }
    out
}

fn fixvec(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(NUMBER_SIZE + items.iter().map(Vec::len).sum::<usize>());
    push_u32(&mut out, items.len());
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

pub fn out_point(value: &OutPoint) -> Vec<u8> {
    value.to_bytes().to_vec()
}

pub fn script(value: &Script) -> Vec<u8> {
    table(&[value.code_hash.as_ref().to_vec(), vec![value.hash_type.to_byte()], bytes(&value.args)])
}

fn script_opt(value: Option<&Script>) -> Vec<u8> {
    value.map(script).unwrap_or_default()
}

fn bytes_opt(value: Option<&Vec<u8>>) -> Vec<u8> {
    value.map(|data| bytes(data)).unwrap_or_default()
}

pub fn cell_input(value: &CellInput) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + OutPoint::SERIALIZED_SIZE);
    out.extend_from_slice(&value.since.to_le_bytes());
    out.extend_from_slice(&value.previous_output.to_bytes());
    out
}

pub fn cell_dep(value: &CellDep) -> Vec<u8> {
    let mut out = out_point(&value.out_point);
    out.push(value.dep_type.to_byte());
    out
}

pub fn cell_output(value: &CellOutput) -> Vec<u8> {
    table(&[value.capacity.to_le_bytes().to_vec(), script(&value.lock), script_opt(value.type_.as_ref())])
}

pub fn raw_transaction(tx: &Transaction) -> Vec<u8> {
    table(&[
        tx.version.to_le_bytes().to_vec(),
        fixvec(&tx.cell_deps.iter().map(cell_dep).collect::<Vec<_>>()),
        fixvec(&tx.header_deps.iter().map(|hash| hash.as_ref().to_vec()).collect::<Vec<_>>()),
        fixvec(&tx.inputs.iter().map(cell_input).collect::<Vec<_>>()),
        table(&tx.outputs.iter().map(cell_output).collect::<Vec<_>>()),
        table(&tx.outputs_data.iter().map(|data| bytes(data)).collect::<Vec<_>>()),
    ])
}

pub fn transaction(tx: &Transaction) -> Vec<u8> {
    table(&[raw_transaction(tx), table(&tx.witnesses.iter().map(|witness| bytes(witness)).collect::<Vec<_>>())])
}

pub fn witness_args(value: &WitnessArgs) -> Vec<u8> {
    table(&[bytes_opt(value.lock.as_ref()), bytes_opt(value.input_type.as_ref()), bytes_opt(value.output_type.as_ref())])
}

fn read_u32(data: &[u8], at: usize) -> Result<usize> {
    let slice = data
        .get(at..at + NUMBER_SIZE)
        .ok_or_else(|| SwapError::EncodingError(format!("molecule: truncated header at offset {}", at)))?;
    let mut buf = [0u8; NUMBER_SIZE];
    buf.copy_from_slice(slice);
    Ok(u32::from_le_bytes(buf) as usize)
}

/// Splits a table into its raw field slices, verifying the header.
fn decode_table(data: &[u8]) -> Result<Vec<&[u8]>> {
    let total = read_u32(data, 0)?;
    if total != data.len() {
        return Err(SwapError::EncodingError(format!("molecule: table size {} does not match {} bytes", total, data.len())));
    }
    if total == NUMBER_SIZE {
        return Ok(Vec::new());
    }
    let first = read_u32(data, NUMBER_SIZE)?;
    if first % NUMBER_SIZE != 0 || first < NUMBER_SIZE * 2 || first > total {
        return Err(SwapError::EncodingError("molecule: invalid first offset".to_string()));
    }
    let count = first / NUMBER_SIZE - 1;
    let mut offsets = Vec::with_capacity(count + 1);
    for i in 0..count {
        offsets.push(read_u32(data, NUMBER_SIZE * (i + 1))?);
    }
    offsets.push(total);
    let mut fields = Vec::with_capacity(count);
    for window in offsets.windows(2) {
        if window[0] > window[1] {
            return Err(SwapError::EncodingError("molecule: offsets are not ascending".to_string()));
        }
        fields.push(&data[window[0]..window[1]]);
    }
    Ok(fields)
}

fn decode_bytes_opt(data: &[u8]) -> Result<Option<Vec<u8>>> {
    if data.is_empty() {
        return Ok(None);
    }
    let len = read_u32(data, 0)?;
    if data.len() != NUMBER_SIZE + len {
        return Err(SwapError::EncodingError(format!("molecule: bytes length {} does not match {} bytes", len, data.len())));
    }
    Ok(Some(data[NUMBER_SIZE..].to_vec()))
}

pub fn decode_witness_args(data: &[u8]) -> Result<WitnessArgs> {
    let fields = decode_table(data)?;
    if fields.len() != 3 {
        return Err(SwapError::EncodingError(format!("witness args must have 3 fields, got {}", fields.len())));
    }
    Ok(WitnessArgs {
        lock: decode_bytes_opt(fields[0])?,
        input_type: decode_bytes_opt(fields[1])?,
        output_type: decode_bytes_opt(fields[2])?,
    })
}
