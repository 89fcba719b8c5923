use std::fmt;

/// Hex formatter for arbitrary bytes in log lines.
///
/// - `Display` (`{}`) prints lowercase hex with a `0x` prefix, matching the node RPC.
/// - `LowerHex` (`{:x}`) prints lowercase hex without prefix; `{:#x}` adds it.
#[derive(Clone, Copy)]
pub struct HexBytes<'a>(pub &'a [u8]);

pub fn hx(bytes: &[u8]) -> HexBytes<'_> {
    HexBytes(bytes)
}

fn fmt_lower_hex_bytes(bytes: &[u8], prefix: bool, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if prefix {
        f.write_str("0x")?;
    }
    for b in bytes {
        write!(f, "{:02x}", b)?;
    }
    Ok(())
}

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_lower_hex_bytes(self.0, true, f)
    }
}

impl fmt::LowerHex for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_lower_hex_bytes(self.0, f.alternate(), f)
    }
}
