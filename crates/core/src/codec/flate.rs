//! FlateDecode filter (§4.6): zlib-wrapped DEFLATE via `flate2`.
//!
//! Corrupted or truncated streams are common in the wild; rather than
//! failing the whole page, decoding falls back to a byte-at-a-time
//! decompression that returns whatever prefix inflated cleanly.

use crate::error::Result;
use std::io::Read;

/// Decode a FlateDecode (zlib) stream, falling back to lenient partial
/// decompression when the stream is truncated or has a bad checksum.
pub fn flatedecode(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    let mut out = Vec::new();
    if decoder.read_to_end(&mut out).is_err() {
        out = decompress_lenient(data);
    }
    Ok(out)
}

/// Best-effort zlib decompression for corrupted streams: feed one byte at a
/// time and keep whatever output was produced before the stream fails.
fn decompress_lenient(data: &[u8]) -> Vec<u8> {
    use flate2::{Decompress, FlushDecompress, Status};
    let mut decoder = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut buf = [0u8; 4096];
    let mut i = 0usize;
    while i < data.len() {
        let before_out = decoder.total_out();
        let before_in = decoder.total_in();
        let res = decoder.decompress(&data[i..i + 1], &mut buf, FlushDecompress::None);
        let produced = (decoder.total_out() - before_out) as usize;
        if produced > 0 {
            out.extend_from_slice(&buf[..produced]);
        }
        let consumed = (decoder.total_in() - before_in) as usize;
        i += if consumed == 0 { 1 } else { consumed };
        match res {
            Ok(Status::StreamEnd) | Err(_) => break,
            Ok(_) => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn round_trip() {
        let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(b"hello flate world").unwrap();
        let compressed = enc.finish().unwrap();
        let decoded = flatedecode(&compressed).unwrap();
        assert_eq!(decoded, b"hello flate world");
    }

    #[test]
    fn truncated_stream_yields_partial_output() {
        let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(b"0123456789abcdefghij").unwrap();
        let compressed = enc.finish().unwrap();
        let truncated = &compressed[..compressed.len() - 2];
        let decoded = flatedecode(truncated).unwrap();
        assert!(decoded.len() <= 20);
    }
}
