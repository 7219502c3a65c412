//! RunLengthDecode filter (§4.6).
//!
//! Length byte 0-127: copy the next (length + 1) bytes literally.
//! Length byte 128: end-of-data marker.
//! Length byte 129-255: repeat the next byte (257 - length) times.
//! Truncated input is tolerated: decoding simply stops.

use crate::error::Result;

pub fn rldecode(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let length = data[i];
        i += 1;

        match length {
            128 => break,
            0..=127 => {
                let count = length as usize + 1;
                if i + count <= data.len() {
                    result.extend_from_slice(&data[i..i + count]);
                    i += count;
                } else {
                    break;
                }
            }
            129..=255 => {
                if i < data.len() {
                    let count = 257 - length as usize;
                    let byte = data[i];
                    i += 1;
                    result.extend(std::iter::repeat_n(byte, count));
                } else {
                    break;
                }
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_run() {
        let data = [2, b'a', b'b', b'c', 128];
        assert_eq!(rldecode(&data).unwrap(), b"abc");
    }

    #[test]
    fn repeat_run() {
        // 257 - 255 = 2 repeats of 'x'
        assert_eq!(rldecode(&[255, b'x', 128]).unwrap(), b"xx");
    }

    #[test]
    fn truncated_input_stops_gracefully() {
        let data = [5u8, b'a', b'b'];
        assert_eq!(rldecode(&data).unwrap(), Vec::<u8>::new());
    }
}
