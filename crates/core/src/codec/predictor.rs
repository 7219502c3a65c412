//! PNG and TIFF predictors used to undo `/DecodeParms` prediction applied
//! before FlateDecode/LZWDecode compression (§4.6).

use crate::error::Result;

/// Reverse PNG-style row prediction (`Predictor` 10-15 share one decoder:
/// the filter-type byte at the start of each row selects None/Sub/Up/
/// Average/Paeth per-row, independent of the `Predictor` value itself).
pub fn apply_png_predictor(data: &[u8], columns: usize, colors: usize, bits_per_component: usize) -> Result<Vec<u8>> {
    let row_bytes = colors * columns * bits_per_component / 8;
    let bpp = std::cmp::max(1, colors * bits_per_component / 8);
    let row_size = row_bytes + 1;

    let mut result = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; row_bytes];

    for row_start in (0..data.len()).step_by(row_size) {
        if row_start + row_size > data.len() {
            break;
        }
        let filter_type = data[row_start];
        let row_data = &data[row_start + 1..row_start + row_size];
        let mut current_row = vec![0u8; row_bytes];

        match filter_type {
            0 => current_row.copy_from_slice(row_data),
            1 => {
                for i in 0..row_bytes {
                    let left = if i >= bpp { current_row[i - bpp] } else { 0 };
                    current_row[i] = row_data[i].wrapping_add(left);
                }
            }
            2 => {
                for i in 0..row_bytes {
                    current_row[i] = row_data[i].wrapping_add(prev_row[i]);
                }
            }
            3 => {
                for i in 0..row_bytes {
                    let left = if i >= bpp { current_row[i - bpp] as u16 } else { 0 };
                    let above = prev_row[i] as u16;
                    current_row[i] = row_data[i].wrapping_add(((left + above) / 2) as u8);
                }
            }
            4 => {
                for i in 0..row_bytes {
                    let left = if i >= bpp { current_row[i - bpp] } else { 0 };
                    let above = prev_row[i];
                    let upper_left = if i >= bpp { prev_row[i - bpp] } else { 0 };
                    current_row[i] = row_data[i].wrapping_add(paeth_predictor(left, above, upper_left));
                }
            }
            _ => current_row.copy_from_slice(row_data),
        }

        result.extend_from_slice(&current_row);
        prev_row = current_row;
    }

    Ok(result)
}

/// Reverse TIFF predictor 2 (horizontal differencing), per component.
pub fn apply_tiff_predictor(data: &mut [u8], columns: usize, colors: usize, bits_per_component: usize) {
    if bits_per_component != 8 {
        // Sub-byte TIFF prediction is rare in PDF content; left undone.
        return;
    }
    let row_bytes = colors * columns;
    for row in data.chunks_mut(row_bytes) {
        for i in colors..row.len() {
            row[i] = row[i].wrapping_add(row[i - colors]);
        }
    }
}

const fn paeth_predictor(left: u8, above: u8, upper_left: u8) -> u8 {
    let a = left as i32;
    let b = above as i32;
    let c = upper_left as i32;
    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        above
    } else {
        upper_left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_filter_passes_through() {
        let data = [0u8, 1, 2, 3, 4];
        let out = apply_png_predictor(&data, 4, 1, 8).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4]);
    }

    #[test]
    fn sub_filter_accumulates_left() {
        let data = [1u8, 10, 1, 1, 1];
        let out = apply_png_predictor(&data, 4, 1, 8).unwrap();
        assert_eq!(out, vec![10, 11, 12, 13]);
    }

    #[test]
    fn tiff_predictor_undoes_horizontal_diff() {
        let mut data = [10u8, 5, 5, 5];
        apply_tiff_predictor(&mut data, 4, 1, 8);
        assert_eq!(data, [10, 15, 20, 25]);
    }
}
