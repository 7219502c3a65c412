//! Standard security handlers for encrypted documents (§4.10).
//!
//! Implements the PDF standard security handler across its three
//! generations: V2 (R2/R3, RC4), V4 (R4, AES-128 with crypt filters), and
//! V5 (R5/R6, AES-256 with the iterative SHA-2 password hash).

use super::saslprep::saslprep;
use crate::codec::aes::{aes_cbc_decrypt, aes_cbc_encrypt, unpad_aes};
use crate::codec::rc4::Rc4;
use crate::error::{PdfError, Result};
use crate::model::Dictionary;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Padding applied to short passwords, fixed by the PDF spec (Algorithm 3.2).
pub const PASSWORD_PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// A PDF standard security handler, selected by the `/Encrypt` dict's V/R pair.
pub trait PDFSecurityHandler: Send + Sync {
    /// Decrypt bytes belonging to object `(objid, genno)`. `attrs` is the
    /// owning stream's dictionary when decrypting a stream body, or `None`
    /// when decrypting a string — V4/V5 handlers use that distinction to
    /// pick between `/StrF` and `/StmF`.
    fn decrypt(&self, objid: u32, genno: u16, data: &[u8], attrs: Option<&Dictionary>) -> Vec<u8>;

    fn decrypt_string(&self, objid: u32, genno: u16, data: &[u8]) -> Vec<u8> {
        self.decrypt(objid, genno, data, None)
    }

    fn decrypt_stream(&self, objid: u32, genno: u16, data: &[u8], attrs: &Dictionary) -> Vec<u8> {
        self.decrypt(objid, genno, data, Some(attrs))
    }
}

/// R2 (40-bit RC4) and R3 (variable-length RC4 up to 128-bit).
pub struct PDFStandardSecurityHandlerV2 {
    key: Vec<u8>,
    r: i64,
    length: i64,
    o: Vec<u8>,
    u: Vec<u8>,
    #[allow(dead_code)]
    p: u32,
    docid: Vec<u8>,
}

impl PDFStandardSecurityHandlerV2 {
    pub const SUPPORTED_REVISIONS: [i64; 2] = [2, 3];

    pub fn new(encrypt: &Dictionary, doc_id: &[Vec<u8>], password: &str) -> Result<Self> {
        let r = get_int(encrypt, "R")?;
        let length = get_int_default(encrypt, "Length", 40).min(128);
        let o = get_bytes(encrypt, "O")?;
        let u = get_bytes(encrypt, "U")?;
        let p = get_uint32(encrypt, "P")?;

        if !Self::SUPPORTED_REVISIONS.contains(&r) {
            return Err(PdfError::Security(format!("unsupported revision R={r}")));
        }

        let docid = doc_id.first().cloned().unwrap_or_default();

        let mut handler = Self {
            key: vec![],
            r,
            length,
            o,
            u,
            p,
            docid,
        };

        let password_bytes = password.as_bytes();
        if let Some(key) = handler.authenticate_user_password(password_bytes) {
            handler.key = key;
            Ok(handler)
        } else if let Some(key) = handler.authenticate_owner_password(password_bytes) {
            handler.key = key;
            Ok(handler)
        } else {
            Err(PdfError::Password)
        }
    }

    /// Algorithm 3.2: derive the file encryption key from a candidate password.
    fn compute_encryption_key(&self, password: &[u8]) -> Vec<u8> {
        let padded = pad_password(password);

        let mut context = md5::Context::new();
        context.consume(padded);
        context.consume(&self.o);
        context.consume(self.p.to_le_bytes());
        context.consume(&self.docid);

        let mut result = context.finalize().0.to_vec();

        let n = if self.r >= 3 { (self.length / 8) as usize } else { 5 };

        if self.r >= 3 {
            for _ in 0..50 {
                result = md5::compute(&result[..n]).0.to_vec();
            }
        }

        result[..n].to_vec()
    }

    /// Algorithm 3.4 (R2) / 3.5 (R3): derive the U value from a candidate key.
    fn compute_u_value(&self, key: &[u8]) -> Vec<u8> {
        if self.r == 2 {
            Rc4::new(key).process(&PASSWORD_PADDING)
        } else {
            let mut context = md5::Context::new();
            context.consume(PASSWORD_PADDING);
            context.consume(&self.docid);
            let hash = context.finalize();

            let mut result = Rc4::new(key).process(&hash.0);
            for i in 1..20u8 {
                let xor_key: Vec<u8> = key.iter().map(|b| b ^ i).collect();
                result = Rc4::new(&xor_key).process(&result);
            }

            let mut padded = result.clone();
            padded.extend_from_slice(&result);
            padded.truncate(32);
            padded
        }
    }

    /// Algorithm 3.6.
    fn verify_encryption_key(&self, key: &[u8]) -> bool {
        let computed_u = self.compute_u_value(key);
        if self.r == 2 {
            computed_u == self.u
        } else {
            computed_u.len() >= 16 && self.u.len() >= 16 && computed_u[..16] == self.u[..16]
        }
    }

    fn authenticate_user_password(&self, password: &[u8]) -> Option<Vec<u8>> {
        let key = self.compute_encryption_key(password);
        self.verify_encryption_key(&key).then_some(key)
    }

    /// Algorithm 3.7: try `password` as the owner password by decrypting
    /// `/O` into a candidate user password and recursing into it.
    fn authenticate_owner_password(&self, password: &[u8]) -> Option<Vec<u8>> {
        let padded = pad_password(password);
        let mut hash = md5::compute(padded).0.to_vec();
        if self.r >= 3 {
            for _ in 0..50 {
                hash = md5::compute(&hash).0.to_vec();
            }
        }

        let n = if self.r >= 3 { (self.length / 8) as usize } else { 5 };
        let key = &hash[..n];

        let user_password = if self.r == 2 {
            Rc4::new(key).process(&self.o)
        } else {
            let mut result = self.o.clone();
            for i in (0..20u8).rev() {
                let xor_key: Vec<u8> = key.iter().map(|b| b ^ i).collect();
                result = Rc4::new(&xor_key).process(&result);
            }
            result
        };

        self.authenticate_user_password(&user_password)
    }

    fn decrypt_rc4(&self, objid: u32, genno: u16, data: &[u8]) -> Vec<u8> {
        let key = object_key_rc4(&self.key, objid, genno);
        Rc4::new(&key).process(data)
    }
}

impl PDFSecurityHandler for PDFStandardSecurityHandlerV2 {
    fn decrypt(&self, objid: u32, genno: u16, data: &[u8], _attrs: Option<&Dictionary>) -> Vec<u8> {
        self.decrypt_rc4(objid, genno, data)
    }
}

/// A `/CF` crypt filter's method, resolved from its `/CFM` name.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CryptMethod {
    Identity,
    V2,
    AESV2,
    AESV3,
}

/// R4: AES-128 selected per-stream/string via `/CF`, `/StrF`, `/StmF`.
pub struct PDFStandardSecurityHandlerV4 {
    key: Vec<u8>,
    #[allow(dead_code)]
    r: i64,
    o: Vec<u8>,
    u: Vec<u8>,
    p: u32,
    docid: Vec<u8>,
    strf: CryptMethod,
    stmf: CryptMethod,
    encrypt_metadata: bool,
}

impl PDFStandardSecurityHandlerV4 {
    pub fn new(encrypt: &Dictionary, doc_id: &[Vec<u8>], password: &str) -> Result<Self> {
        let r = get_int(encrypt, "R")?;
        if r != 4 {
            return Err(PdfError::Security(format!("V4 handler requires R=4, got R={r}")));
        }

        let o = get_bytes(encrypt, "O")?;
        let u = get_bytes(encrypt, "U")?;
        let p = get_uint32(encrypt, "P")?;

        let strf_name = get_name_default(encrypt, "StrF", "Identity");
        let stmf_name = get_name_default(encrypt, "StmF", "Identity");
        let cf = get_dict(encrypt, "CF").unwrap_or_default();
        let strf = Self::resolve_crypt_method(&cf, &strf_name)?;
        let stmf = Self::resolve_crypt_method(&cf, &stmf_name)?;

        let encrypt_metadata = get_bool_default(encrypt, "EncryptMetadata", true);
        let docid = doc_id.first().cloned().unwrap_or_default();

        let mut handler = Self {
            key: vec![],
            r,
            o,
            u,
            p,
            docid,
            strf,
            stmf,
            encrypt_metadata,
        };

        let password_bytes = password.as_bytes();
        if let Some(key) = handler.authenticate_user_password(password_bytes) {
            handler.key = key;
            Ok(handler)
        } else if let Some(key) = handler.authenticate_owner_password(password_bytes) {
            handler.key = key;
            Ok(handler)
        } else {
            Err(PdfError::Password)
        }
    }

    fn resolve_crypt_method(cf: &Dictionary, name: &str) -> Result<CryptMethod> {
        if name == "Identity" {
            return Ok(CryptMethod::Identity);
        }
        let filter = cf
            .get(name)
            .and_then(|v| v.as_dict().ok())
            .ok_or_else(|| PdfError::Security(format!("crypt filter '{name}' not found in CF")))?;
        let cfm = filter.get("CFM").and_then(|v| v.as_name().ok()).unwrap_or("None");
        match cfm {
            "V2" => Ok(CryptMethod::V2),
            "AESV2" => Ok(CryptMethod::AESV2),
            "AESV3" => Ok(CryptMethod::AESV3),
            "None" => Ok(CryptMethod::Identity),
            other => Err(PdfError::Security(format!("unknown crypt filter method {other}"))),
        }
    }

    /// Same as Algorithm 3.2, but folds in `0xFFFFFFFF` when metadata is
    /// left unencrypted, and always applies the R3+ 50-round re-hash.
    fn compute_encryption_key(&self, password: &[u8]) -> Vec<u8> {
        let padded = pad_password(password);

        let mut context = md5::Context::new();
        context.consume(padded);
        context.consume(&self.o);
        context.consume(self.p.to_le_bytes());
        context.consume(&self.docid);
        if !self.encrypt_metadata {
            context.consume([0xFF, 0xFF, 0xFF, 0xFF]);
        }

        let mut result = context.finalize().0.to_vec();
        for _ in 0..50 {
            result = md5::compute(&result[..16]).0.to_vec();
        }
        result[..16].to_vec()
    }

    fn compute_u_value(&self, key: &[u8]) -> Vec<u8> {
        let mut context = md5::Context::new();
        context.consume(PASSWORD_PADDING);
        context.consume(&self.docid);
        let hash = context.finalize();

        let mut result = Rc4::new(key).process(&hash.0);
        for i in 1..20u8 {
            let xor_key: Vec<u8> = key.iter().map(|b| b ^ i).collect();
            result = Rc4::new(&xor_key).process(&result);
        }

        let mut padded = result.clone();
        padded.extend_from_slice(&result);
        padded.truncate(32);
        padded
    }

    fn verify_encryption_key(&self, key: &[u8]) -> bool {
        let computed_u = self.compute_u_value(key);
        computed_u.len() >= 16 && self.u.len() >= 16 && computed_u[..16] == self.u[..16]
    }

    fn authenticate_user_password(&self, password: &[u8]) -> Option<Vec<u8>> {
        let key = self.compute_encryption_key(password);
        self.verify_encryption_key(&key).then_some(key)
    }

    fn authenticate_owner_password(&self, password: &[u8]) -> Option<Vec<u8>> {
        let padded = pad_password(password);
        let mut hash = md5::compute(padded).0.to_vec();
        for _ in 0..50 {
            hash = md5::compute(&hash).0.to_vec();
        }

        let key = &hash[..16];
        let mut result = self.o.clone();
        for i in (0..20u8).rev() {
            let xor_key: Vec<u8> = key.iter().map(|b| b ^ i).collect();
            result = Rc4::new(&xor_key).process(&result);
        }

        self.authenticate_user_password(&result)
    }

    fn decrypt_with_method(&self, method: CryptMethod, objid: u32, genno: u16, data: &[u8]) -> Vec<u8> {
        match method {
            CryptMethod::Identity => data.to_vec(),
            CryptMethod::V2 => self.decrypt_rc4(objid, genno, data),
            CryptMethod::AESV2 => self.decrypt_aes128(objid, genno, data),
            CryptMethod::AESV3 => data.to_vec(),
        }
    }

    fn decrypt_rc4(&self, objid: u32, genno: u16, data: &[u8]) -> Vec<u8> {
        let key = object_key_rc4(&self.key, objid, genno);
        Rc4::new(&key).process(data)
    }

    fn decrypt_aes128(&self, objid: u32, genno: u16, data: &[u8]) -> Vec<u8> {
        if data.len() < 16 {
            return data.to_vec();
        }

        let mut key_data = self.key.clone();
        key_data.extend_from_slice(&objid.to_le_bytes()[..3]);
        key_data.extend_from_slice(&(genno as u32).to_le_bytes()[..2]);
        key_data.extend_from_slice(b"sAlT");
        let hash = md5::compute(&key_data);
        let key = &hash.0[..16];

        let iv = &data[..16];
        let ciphertext = &data[16..];
        if ciphertext.is_empty() {
            return vec![];
        }

        let plaintext = aes_cbc_decrypt(key, iv, ciphertext);
        unpad_aes(&plaintext).to_vec()
    }

    fn is_metadata_stream(&self, attrs: Option<&Dictionary>) -> bool {
        attrs
            .and_then(|a| a.get("Type"))
            .and_then(|t| t.as_name().ok())
            .is_some_and(|name| name == "Metadata")
    }
}

impl PDFSecurityHandler for PDFStandardSecurityHandlerV4 {
    fn decrypt(&self, objid: u32, genno: u16, data: &[u8], attrs: Option<&Dictionary>) -> Vec<u8> {
        if !self.encrypt_metadata && self.is_metadata_stream(attrs) {
            return data.to_vec();
        }
        let method = if attrs.is_some() { self.stmf } else { self.strf };
        self.decrypt_with_method(method, objid, genno, data)
    }
}

/// R5/R6: AES-256 with a SHA-2-based iterative password hash and an
/// encrypted-key-material indirection (`/OE`, `/UE`).
pub struct PDFStandardSecurityHandlerV5 {
    key: Vec<u8>,
    r: i64,
    oe: Vec<u8>,
    ue: Vec<u8>,
    o_hash: Vec<u8>,
    o_validation_salt: Vec<u8>,
    o_key_salt: Vec<u8>,
    u_hash: Vec<u8>,
    u_validation_salt: Vec<u8>,
    u_key_salt: Vec<u8>,
    u: Vec<u8>,
    strf: CryptMethod,
    stmf: CryptMethod,
    encrypt_metadata: bool,
}

impl PDFStandardSecurityHandlerV5 {
    pub const SUPPORTED_REVISIONS: [i64; 2] = [5, 6];

    pub fn new(encrypt: &Dictionary, _doc_id: &[Vec<u8>], password: &str) -> Result<Self> {
        let r = get_int(encrypt, "R")?;
        if !Self::SUPPORTED_REVISIONS.contains(&r) {
            return Err(PdfError::Security(format!("V5 handler requires R=5 or R=6, got R={r}")));
        }

        let o = get_bytes(encrypt, "O")?;
        let u = get_bytes(encrypt, "U")?;
        let oe = get_bytes(encrypt, "OE")?;
        let ue = get_bytes(encrypt, "UE")?;

        if o.len() < 48 {
            return Err(PdfError::Security(format!("O value too short: {} bytes", o.len())));
        }
        if u.len() < 48 {
            return Err(PdfError::Security(format!("U value too short: {} bytes", u.len())));
        }
        if oe.len() < 32 {
            return Err(PdfError::Security(format!("OE value too short: {} bytes", oe.len())));
        }
        if ue.len() < 32 {
            return Err(PdfError::Security(format!("UE value too short: {} bytes", ue.len())));
        }

        let o_hash = o[..32].to_vec();
        let o_validation_salt = o[32..40].to_vec();
        let o_key_salt = o[40..48].to_vec();
        let u_hash = u[..32].to_vec();
        let u_validation_salt = u[32..40].to_vec();
        let u_key_salt = u[40..48].to_vec();

        let strf_name = get_name_default(encrypt, "StrF", "Identity");
        let stmf_name = get_name_default(encrypt, "StmF", "Identity");
        let cf = get_dict(encrypt, "CF").unwrap_or_default();
        let strf = Self::resolve_crypt_method(&cf, &strf_name)?;
        let stmf = Self::resolve_crypt_method(&cf, &stmf_name)?;

        let encrypt_metadata = get_bool_default(encrypt, "EncryptMetadata", true);

        let mut handler = Self {
            key: vec![],
            r,
            oe,
            ue,
            o_hash,
            o_validation_salt,
            o_key_salt,
            u_hash,
            u_validation_salt,
            u_key_salt,
            u,
            strf,
            stmf,
            encrypt_metadata,
        };

        if let Some(key) = handler.authenticate(password) {
            handler.key = key;
            Ok(handler)
        } else {
            Err(PdfError::Password)
        }
    }

    fn resolve_crypt_method(cf: &Dictionary, name: &str) -> Result<CryptMethod> {
        if name == "Identity" {
            return Ok(CryptMethod::Identity);
        }
        let filter = cf
            .get(name)
            .and_then(|v| v.as_dict().ok())
            .ok_or_else(|| PdfError::Security(format!("crypt filter '{name}' not found in CF")))?;
        let cfm = filter.get("CFM").and_then(|v| v.as_name().ok()).unwrap_or("None");
        match cfm {
            "AESV3" => Ok(CryptMethod::AESV3),
            "AESV2" => Ok(CryptMethod::AESV2),
            "V2" => Ok(CryptMethod::V2),
            "None" => Ok(CryptMethod::Identity),
            other => Err(PdfError::Security(format!("unknown crypt filter method {other}"))),
        }
    }

    /// Try the owner password first, then the user password, each against
    /// its own validation salt and (for the owner) the full `/U` value.
    fn authenticate(&self, password: &str) -> Option<Vec<u8>> {
        let password_bytes = self.normalize_password(password);

        let hash = self.password_hash(&password_bytes, &self.o_validation_salt, Some(&self.u));
        if hash == self.o_hash {
            let key_hash = self.password_hash(&password_bytes, &self.o_key_salt, Some(&self.u));
            return Some(aes_cbc_decrypt(&key_hash, &[0u8; 16], &self.oe));
        }

        let hash = self.password_hash(&password_bytes, &self.u_validation_salt, None);
        if hash == self.u_hash {
            let key_hash = self.password_hash(&password_bytes, &self.u_key_salt, None);
            return Some(aes_cbc_decrypt(&key_hash, &[0u8; 16], &self.ue));
        }

        None
    }

    fn normalize_password(&self, password: &str) -> Vec<u8> {
        if self.r == 6 {
            if password.is_empty() {
                return vec![];
            }
            let prepped = saslprep(password, true).unwrap_or_else(|_| password.to_string());
            let bytes = prepped.as_bytes();
            bytes[..bytes.len().min(127)].to_vec()
        } else {
            let bytes = password.as_bytes();
            bytes[..bytes.len().min(127)].to_vec()
        }
    }

    fn password_hash(&self, password: &[u8], salt: &[u8], vector: Option<&[u8]>) -> Vec<u8> {
        if self.r == 5 {
            Self::r5_password(password, salt, vector)
        } else {
            Self::r6_password(password, &salt[..8], vector)
        }
    }

    fn r5_password(password: &[u8], salt: &[u8], vector: Option<&[u8]>) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(password);
        hasher.update(salt);
        if let Some(v) = vector {
            hasher.update(v);
        }
        hasher.finalize().to_vec()
    }

    /// ISO 32000-2's iterative hash (PDF 2.0, also used by Acrobat's R6):
    /// repeatedly AES-encrypt 64 copies of `password||k||vector` and re-hash
    /// with SHA-256/384/512 chosen by the encrypted block's byte sum mod 3,
    /// until at least 64 rounds have run and the last output byte is small.
    fn r6_password(password: &[u8], salt: &[u8], vector: Option<&[u8]>) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(password);
        hasher.update(salt);
        if let Some(v) = vector {
            hasher.update(v);
        }
        let mut k = hasher.finalize().to_vec();

        let mut round_no = 0u32;
        let mut last_byte_val = 0u8;

        while round_no < 64 || last_byte_val > (round_no as u8).wrapping_sub(32) {
            let vector_bytes = vector.unwrap_or(&[]);
            let base: Vec<u8> = password.iter().chain(k.iter()).chain(vector_bytes.iter()).copied().collect();
            let mut k1 = Vec::with_capacity(base.len() * 64);
            for _ in 0..64 {
                k1.extend_from_slice(&base);
            }

            let e = aes_cbc_encrypt(&k[..16], &k[16..32], &k1);

            k = match Self::bytes_mod_3(&e[..16]) {
                0 => Sha256::digest(&e).to_vec(),
                1 => Sha384::digest(&e).to_vec(),
                _ => Sha512::digest(&e).to_vec(),
            };

            last_byte_val = e[e.len() - 1];
            round_no += 1;
        }

        k[..32].to_vec()
    }

    fn bytes_mod_3(input: &[u8]) -> usize {
        input.iter().map(|&b| (b % 3) as usize).sum::<usize>() % 3
    }

    fn decrypt_aes256(&self, data: &[u8]) -> Vec<u8> {
        if data.len() < 16 {
            return data.to_vec();
        }
        let iv = &data[..16];
        let ciphertext = &data[16..];
        if ciphertext.is_empty() {
            return vec![];
        }
        let plaintext = aes_cbc_decrypt(&self.key, iv, ciphertext);
        unpad_aes(&plaintext).to_vec()
    }

    fn decrypt_with_method(&self, method: CryptMethod, data: &[u8]) -> Vec<u8> {
        match method {
            CryptMethod::Identity => data.to_vec(),
            CryptMethod::AESV3 => self.decrypt_aes256(data),
            CryptMethod::AESV2 | CryptMethod::V2 => data.to_vec(),
        }
    }

    fn is_metadata_stream(&self, attrs: Option<&Dictionary>) -> bool {
        attrs
            .and_then(|a| a.get("Type"))
            .and_then(|t| t.as_name().ok())
            .is_some_and(|name| name == "Metadata")
    }
}

impl PDFSecurityHandler for PDFStandardSecurityHandlerV5 {
    fn decrypt(&self, _objid: u32, _genno: u16, data: &[u8], attrs: Option<&Dictionary>) -> Vec<u8> {
        if !self.encrypt_metadata && self.is_metadata_stream(attrs) {
            return data.to_vec();
        }
        let method = if attrs.is_some() { self.stmf } else { self.strf };
        self.decrypt_with_method(method, data)
    }
}

fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    if len < 32 {
        padded[len..].copy_from_slice(&PASSWORD_PADDING[..32 - len]);
    }
    padded
}

/// Object-specific RC4 key: base key + objid (3 LE bytes) + genno (2 LE
/// bytes), MD5-hashed and truncated to `min(keylen + 5, 16)` bytes.
fn object_key_rc4(base_key: &[u8], objid: u32, genno: u16) -> Vec<u8> {
    let mut key_data = base_key.to_vec();
    key_data.extend_from_slice(&objid.to_le_bytes()[..3]);
    key_data.extend_from_slice(&(genno as u32).to_le_bytes()[..2]);
    let hash = md5::compute(&key_data);
    let key_len = (base_key.len() + 5).min(16);
    hash.0[..key_len].to_vec()
}

fn get_int(encrypt: &Dictionary, key: &str) -> Result<i64> {
    encrypt
        .get(key)
        .ok_or_else(|| PdfError::Security(format!("missing {key} in /Encrypt")))?
        .as_int()
}

fn get_int_default(encrypt: &Dictionary, key: &str, default: i64) -> i64 {
    encrypt.get(key).and_then(|v| v.as_int().ok()).unwrap_or(default)
}

fn get_bytes(encrypt: &Dictionary, key: &str) -> Result<Vec<u8>> {
    encrypt
        .get(key)
        .ok_or_else(|| PdfError::Security(format!("missing {key} in /Encrypt")))?
        .as_string()
        .map(|s| s.to_vec())
}

fn get_uint32(encrypt: &Dictionary, key: &str) -> Result<u32> {
    Ok(get_int(encrypt, key)? as u32)
}

fn get_name_default(encrypt: &Dictionary, key: &str, default: &str) -> String {
    encrypt
        .get(key)
        .and_then(|v| v.as_name().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| default.to_string())
}

fn get_dict(encrypt: &Dictionary, key: &str) -> Option<Dictionary> {
    encrypt.get(key).and_then(|v| v.as_dict().ok()).cloned()
}

fn get_bool_default(encrypt: &Dictionary, key: &str, default: bool) -> bool {
    encrypt.get(key).and_then(|v| v.as_bool().ok()).unwrap_or(default)
}

/// Build the handler named by `/Encrypt`'s `/V`+`/R` pair, or `None` if the
/// document isn't encrypted.
pub fn create_security_handler(
    encrypt: &Dictionary,
    doc_id: &[Vec<u8>],
    password: &str,
) -> Result<Option<Box<dyn PDFSecurityHandler + Send + Sync>>> {
    if encrypt.is_empty() {
        return Ok(None);
    }

    let v = get_int_default(encrypt, "V", 0);
    let r = get_int(encrypt, "R")?;

    match (v, r) {
        (1, 2) | (2, 3) => Ok(Some(Box::new(PDFStandardSecurityHandlerV2::new(
            encrypt, doc_id, password,
        )?))),
        (4, 4) => Ok(Some(Box::new(PDFStandardSecurityHandlerV4::new(
            encrypt, doc_id, password,
        )?))),
        (5, 5) | (5, 6) => Ok(Some(Box::new(PDFStandardSecurityHandlerV5::new(
            encrypt, doc_id, password,
        )?))),
        _ => Err(PdfError::Security(format!("unsupported encryption V={v}, R={r}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encrypt_dict_v2(r: i64, length: i64, o: Vec<u8>, u: Vec<u8>, p: i64) -> Dictionary {
        let mut d = Dictionary::new();
        d.insert("R".into(), crate::model::PDFObject::Int(r));
        d.insert("V".into(), crate::model::PDFObject::Int(if r == 2 { 1 } else { 2 }));
        d.insert("Length".into(), crate::model::PDFObject::Int(length));
        d.insert("O".into(), crate::model::PDFObject::string(o));
        d.insert("U".into(), crate::model::PDFObject::string(u));
        d.insert("P".into(), crate::model::PDFObject::Int(p));
        d
    }

    #[test]
    fn v2_r2_empty_password_round_trips() {
        // Construct an O/U pair the way Algorithm 3.3/3.4 would for an
        // empty owner and user password, then confirm the handler built
        // with that pair authenticates the empty user password.
        let docid = b"docid1234567890A".to_vec();
        let r = 2;
        let length = 40;
        let p: i64 = -3904;

        // Owner key for an empty owner password is just the padded-password MD5.
        let padded = PASSWORD_PADDING;
        let okey = md5::compute(padded).0[..5].to_vec();
        let o = Rc4::new(&okey).process(&PASSWORD_PADDING);

        let mut context = md5::Context::new();
        context.consume(padded);
        context.consume(&o);
        context.consume((p as u32).to_le_bytes());
        context.consume(&docid);
        let key = context.finalize().0[..5].to_vec();
        let u = Rc4::new(&key).process(&PASSWORD_PADDING);

        let encrypt = encrypt_dict_v2(r, length, o, u, p);
        let handler = PDFStandardSecurityHandlerV2::new(&encrypt, &[docid], "").unwrap();
        assert_eq!(handler.key.len(), 5);
    }

    #[test]
    fn wrong_password_is_rejected() {
        let docid = vec![0u8; 16];
        let encrypt = encrypt_dict_v2(2, 40, vec![0u8; 32], vec![1u8; 32], 0);
        assert!(PDFStandardSecurityHandlerV2::new(&encrypt, &[docid], "wrong").is_err());
    }

    #[test]
    fn rc4_object_key_is_derived_per_object() {
        let key_a = object_key_rc4(&[1, 2, 3, 4, 5], 10, 0);
        let key_b = object_key_rc4(&[1, 2, 3, 4, 5], 11, 0);
        assert_ne!(key_a, key_b);
    }

    #[test]
    fn create_security_handler_rejects_unknown_v_r() {
        let mut encrypt = Dictionary::new();
        encrypt.insert("V".into(), crate::model::PDFObject::Int(99));
        encrypt.insert("R".into(), crate::model::PDFObject::Int(99));
        assert!(create_security_handler(&encrypt, &[], "").is_err());
    }

    #[test]
    fn create_security_handler_empty_dict_is_unencrypted() {
        let encrypt = Dictionary::new();
        assert!(create_security_handler(&encrypt, &[], "").unwrap().is_none());
    }
}
