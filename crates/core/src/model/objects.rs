//! The PDF object model: the eight value kinds plus indirect references.
//!
//! [`PDFObject`] is a closed, tagged sum — there is no inheritance hierarchy,
//! dispatch is always a `match` on the discriminant. Indirect references do
//! not own their referent; resolving one goes through
//! [`crate::document::Document`]'s object cache.

use crate::error::{PdfError, Result};
use bytes::Bytes;
use std::collections::HashMap;

/// A PDF dictionary: name keys, insertion order irrelevant, last writer wins
/// on the wire if a key repeats during parsing.
pub type Dictionary = HashMap<String, PDFObject>;

/// The fundamental value type in a PDF file.
///
/// `Number` is split into `Int`/`Real` rather than collapsed into `f64`
/// because integer identity matters for object numbers and array indices
/// that happen to appear as plain numbers in content streams.
#[derive(Debug, Clone, PartialEq)]
pub enum PDFObject {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    /// Name object (e.g. `/Type`, `/Font`). Escape sequences (`#xx`) are
    /// decoded once, at parse time.
    Name(String),
    /// A string literal. `is_hex` records whether it was written `(...)` or
    /// `<...>` on the wire; both decode to the same byte semantics but a
    /// caller writing the document back out (outside this crate's scope)
    /// would need to know which.
    String { bytes: Vec<u8>, is_hex: bool },
    Array(Vec<Self>),
    Dict(Dictionary),
    Stream(Box<PDFStream>),
    Ref(PDFObjRef),
}

impl PDFObject {
    pub fn string(bytes: Vec<u8>) -> Self {
        PDFObject::String {
            bytes,
            is_hex: false,
        }
    }

    pub fn hex_string(bytes: Vec<u8>) -> Self {
        PDFObject::String { bytes, is_hex: true }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(self.type_error("bool")),
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            _ => Err(self.type_error("int")),
        }
    }

    pub fn as_real(&self) -> Result<f64> {
        match self {
            Self::Real(n) => Ok(*n),
            _ => Err(self.type_error("real")),
        }
    }

    /// Numeric value coerced to `f64`, accepting either `Int` or `Real`.
    pub fn as_num(&self) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Real(n) => Ok(*n),
            _ => Err(self.type_error("number")),
        }
    }

    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(self.type_error("name")),
        }
    }

    pub fn as_string(&self) -> Result<&[u8]> {
        match self {
            Self::String { bytes, .. } => Ok(bytes),
            _ => Err(self.type_error("string")),
        }
    }

    pub fn as_array(&self) -> Result<&Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(self.type_error("array")),
        }
    }

    pub fn as_dict(&self) -> Result<&Dictionary> {
        match self {
            Self::Dict(d) => Ok(d),
            Self::Stream(s) => Ok(&s.attrs),
            _ => Err(self.type_error("dict")),
        }
    }

    pub fn as_stream(&self) -> Result<&PDFStream> {
        match self {
            Self::Stream(s) => Ok(s),
            _ => Err(self.type_error("stream")),
        }
    }

    pub fn as_ref(&self) -> Result<&PDFObjRef> {
        match self {
            Self::Ref(r) => Ok(r),
            _ => Err(self.type_error("ref")),
        }
    }

    fn type_error(&self, expected: &'static str) -> PdfError {
        PdfError::corrupt(format!(
            "type error: expected {expected}, got {}",
            self.type_name()
        ))
    }

    const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::String { .. } => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Stream(_) => "stream",
            Self::Ref(_) => "ref",
        }
    }
}

/// An indirect object reference: `(object number, generation)`.
///
/// Does not own its referent. Dereferencing goes through the owning
/// document's cache, which is what makes cyclic dictionaries (e.g. a page's
/// `/Parent` link) safe: the cache returns the already-under-construction
/// placeholder instead of recursing forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PDFObjRef {
    pub objid: u32,
    pub genno: u16,
}

impl PDFObjRef {
    pub const fn new(objid: u32, genno: u16) -> Self {
        Self { objid, genno }
    }
}

/// A stream object: a dictionary plus a lazily-decoded byte payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PDFStream {
    pub attrs: Dictionary,
    /// Bytes exactly as they appear between `stream` and `endstream`,
    /// filters not yet applied.
    rawdata: Bytes,
    /// Whether `rawdata` has already had document-level decryption applied.
    rawdata_decrypted: bool,
    /// Decoded (filters-applied) data, filled in on first access.
    decoded: Option<Bytes>,
    pub objid: Option<u32>,
    pub genno: Option<u16>,
}

impl PDFStream {
    pub fn new(attrs: Dictionary, rawdata: impl Into<Bytes>) -> Self {
        Self {
            attrs,
            rawdata: rawdata.into(),
            rawdata_decrypted: false,
            decoded: None,
            objid: None,
            genno: None,
        }
    }

    pub fn set_objid(&mut self, objid: u32, genno: u16) {
        self.objid = Some(objid);
        self.genno = Some(genno);
    }

    pub fn rawdata(&self) -> &[u8] {
        self.rawdata.as_ref()
    }

    pub fn rawdata_bytes(&self) -> Bytes {
        self.rawdata.clone()
    }

    pub const fn rawdata_is_decrypted(&self) -> bool {
        self.rawdata_decrypted
    }

    pub fn set_rawdata_decrypted(&mut self, data: Vec<u8>) {
        self.rawdata = Bytes::from(data);
        self.rawdata_decrypted = true;
        self.decoded = None;
    }

    /// Cached decoded bytes, if filters have already been applied once.
    pub fn cached_decoded(&self) -> Option<&[u8]> {
        self.decoded.as_deref()
    }

    pub fn cache_decoded(&mut self, data: Bytes) {
        self.decoded = Some(data);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&PDFObject> {
        self.attrs.get(name)
    }

    pub fn get_any(&self, names: &[&str]) -> Option<&PDFObject> {
        names.iter().find_map(|name| self.attrs.get(*name))
    }
}

// === Free-function coercion helpers, mirroring pdfminer.six's pdftypes.py ===

pub fn int_value(obj: &PDFObject) -> Result<i64> {
    obj.as_int()
}

pub fn num_value(obj: &PDFObject) -> Result<f64> {
    obj.as_num()
}

pub fn str_value(obj: &PDFObject) -> Result<&[u8]> {
    obj.as_string()
}

pub fn list_value(obj: &PDFObject) -> Result<&Vec<PDFObject>> {
    obj.as_array()
}

pub fn dict_value(obj: &PDFObject) -> Result<&Dictionary> {
    obj.as_dict()
}

pub fn stream_value(obj: &PDFObject) -> Result<&PDFStream> {
    obj.as_stream()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_kinds_stay_distinct() {
        let int_obj = PDFObject::Int(3);
        let real_obj = PDFObject::Real(3.0);
        assert_ne!(int_obj, real_obj);
        assert_eq!(int_obj.as_num().unwrap(), 3.0);
        assert_eq!(real_obj.as_num().unwrap(), 3.0);
        assert!(int_obj.as_real().is_err());
    }

    #[test]
    fn string_tracks_hex_flag() {
        let lit = PDFObject::string(b"hi".to_vec());
        let hex = PDFObject::hex_string(b"hi".to_vec());
        assert_eq!(lit.as_string().unwrap(), hex.as_string().unwrap());
        assert_ne!(lit, hex);
    }

    #[test]
    fn type_error_is_corrupt_not_panic() {
        let obj = PDFObject::Null;
        assert!(matches!(obj.as_int(), Err(PdfError::Corrupt { .. })));
    }
}
