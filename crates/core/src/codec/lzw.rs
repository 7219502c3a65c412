//! LZWDecode filter (§4.6), via the `weezl` crate.

use crate::error::Result;
use weezl::{decode::Decoder, BitOrder};

/// Decode LZW data with the PDF default `EarlyChange` of 1.
pub fn lzwdecode(data: &[u8]) -> Result<Vec<u8>> {
    lzwdecode_with_early_change(data, 1)
}

/// Decode LZW data with an explicit `EarlyChange` (0 or 1, from `/DecodeParms`).
pub fn lzwdecode_with_early_change(data: &[u8], early_change: i64) -> Result<Vec<u8>> {
    let mut decoder = if early_change == 0 {
        Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
    } else {
        Decoder::new(BitOrder::Msb, 8)
    };
    let mut output = Vec::new();
    // Lenient: ignore mid-stream errors and keep whatever decoded cleanly.
    let _ = decoder.into_vec(&mut output).decode(data);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_decodes_to_empty() {
        assert_eq!(lzwdecode(&[]).unwrap(), Vec::<u8>::new());
    }
}
