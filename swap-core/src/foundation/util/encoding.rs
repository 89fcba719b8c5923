use crate::foundation::{Hash32, SwapError};

/// Strips an optional `0x`/`0X` prefix.
pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

pub fn decode_hex(s: &str) -> Result<Vec<u8>, SwapError> {
    hex::decode(strip_hex_prefix(s.trim())).map_err(|e| e.into())
}

pub fn encode_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn parse_hex_32bytes(s: &str) -> Result<Hash32, SwapError> {
    let bytes = decode_hex(s)?;
    bytes.as_slice().try_into().map_err(|_| SwapError::EncodingError(format!("expected 32 bytes, got {}", bytes.len())))
}

pub fn parse_hex_fixed<const N: usize>(s: &str) -> Result<[u8; N], SwapError> {
    let bytes = decode_hex(s)?;
    bytes.as_slice().try_into().map_err(|_| SwapError::EncodingError(format!("expected {} bytes, got {}", N, bytes.len())))
}

/// Parses a quantity given as `0x` hex or as a decimal string.
pub fn parse_quantity(s: &str) -> Result<u128, SwapError> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some("") => return Err(SwapError::EncodingError("empty hex quantity".to_string())),
        Some(hex_digits) => u128::from_str_radix(hex_digits, 16),
        None => s.parse::<u128>(),
    };
    parsed.map_err(|err| SwapError::EncodingError(format!("invalid quantity '{}': {}", s, err)))
}

pub fn format_quantity(value: u128) -> String {
    format!("{:#x}", value)
}
