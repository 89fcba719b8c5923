use crate::foundation::{Result, SwapError, UDT_AMOUNT_SIZE};

/// Token amount held by a UDT cell: the first 16 data bytes, little endian.
///
/// Data shorter than 16 bytes reads as zero.
pub fn udt_amount(data: &[u8]) -> u128 {
    data.get(..UDT_AMOUNT_SIZE)
        .map(|bytes| {
            let mut buf = [0u8; UDT_AMOUNT_SIZE];
            buf.copy_from_slice(bytes);
            u128::from_le_bytes(buf)
        })
        .unwrap_or(0)
}

/// Rewrites the amount, preserving any trailing extension bytes.
pub fn set_udt_amount(data: &mut Vec<u8>, amount: u128) {
    if data.len() < UDT_AMOUNT_SIZE {
        data.resize(UDT_AMOUNT_SIZE, 0);
    }
    data[..UDT_AMOUNT_SIZE].copy_from_slice(&amount.to_le_bytes());
}

pub fn encode_udt_amount(amount: u128) -> Vec<u8> {
    amount.to_le_bytes().to_vec()
}

pub fn checked_sum(amounts: impl IntoIterator<Item = u128>) -> Result<u128> {
    amounts
        .into_iter()
        .try_fold(0u128, |acc, amount| acc.checked_add(amount))
        .ok_or_else(|| SwapError::invalid_input("asset amount overflow"))
}
