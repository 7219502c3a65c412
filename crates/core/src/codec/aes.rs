//! AES-CBC helpers for the AESV2/AESV3 security handlers (§4.10).

use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use cbc::{Decryptor, Encryptor};

type Aes128CbcDec = Decryptor<aes::Aes128>;
type Aes256CbcDec = Decryptor<aes::Aes256>;
type Aes128CbcEnc = Encryptor<aes::Aes128>;

/// Decrypt AES-CBC data with a 128- or 256-bit key and a 16-byte IV.
/// Data length must be a multiple of the block size; the PDF convention
/// stores the IV as the first 16 bytes of the ciphertext.
pub fn aes_cbc_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Vec<u8> {
    if iv.len() != 16 || data.is_empty() || data.len() % 16 != 0 {
        return Vec::new();
    }
    let mut buf = data.to_vec();
    let decrypted = match key.len() {
        16 => Aes128CbcDec::new(key.into(), iv.into())
            .decrypt_padded_mut::<aes::cipher::block_padding::NoPadding>(&mut buf),
        32 => Aes256CbcDec::new(key.into(), iv.into())
            .decrypt_padded_mut::<aes::cipher::block_padding::NoPadding>(&mut buf),
        _ => return Vec::new(),
    };
    match decrypted {
        Ok(out) => unpad_aes(out).to_vec(),
        Err(_) => Vec::new(),
    }
}

/// Encrypt with AES-128-CBC and no padding (used by the R6 password hash's
/// internal iteration, which always feeds full-block input).
pub fn aes_cbc_encrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Vec<u8> {
    let mut buf = data.to_vec();
    let cipher = Aes128CbcEnc::new(key.into(), iv.into());
    cipher
        .encrypt_padded_mut::<aes::cipher::block_padding::NoPadding>(&mut buf, data.len())
        .expect("input is a multiple of the AES block size");
    buf
}

/// Remove PKCS#7 padding, tolerating malformed padding by returning the
/// data unchanged rather than erroring (a wrongly-decrypted stream is
/// discovered downstream when its bytes don't parse, not here).
pub fn unpad_aes(data: &[u8]) -> &[u8] {
    if data.is_empty() {
        return data;
    }
    let pad_len = data[data.len() - 1] as usize;
    if pad_len == 0 || pad_len > 16 || pad_len > data.len() {
        return data;
    }
    let start = data.len() - pad_len;
    if data[start..].iter().all(|&b| b as usize == pad_len) {
        &data[..start]
    } else {
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::{BlockEncryptMut, KeyIvInit as _};

    #[test]
    fn round_trip_aes128() {
        let key = [0x42u8; 16];
        let iv = [0x11u8; 16];
        let plaintext = b"sixteen byte msg";
        let mut buf = plaintext.to_vec();
        let enc = cbc::Encryptor::<aes::Aes128>::new(&key.into(), &iv.into());
        enc.encrypt_padded_mut::<aes::cipher::block_padding::NoPadding>(&mut buf, plaintext.len())
            .unwrap();
        let decrypted = aes_cbc_decrypt(&key, &iv, &buf);
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn bad_iv_length_returns_empty() {
        assert!(aes_cbc_decrypt(&[0u8; 16], &[0u8; 4], &[0u8; 16]).is_empty());
    }
}
