//! The closed error taxonomy surfaced at the library boundary.
//!
//! Internally, routines fail in many specific ways (a bad token, an unknown
//! glyph, a type mismatch while coercing an object). Those all collapse into
//! one of the six variants below by the time they reach a caller: most of
//! them become [`PdfError::Corrupt`], since a malformed sub-object should not
//! prevent the rest of the document from being read.

use thiserror::Error;

/// Primary error type returned at the crate's public boundary.
#[derive(Error, Debug)]
pub enum PdfError {
    /// The byte source returned fewer bytes than requested, or failed outright.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Syntax was violated unrecoverably (truncated header, no trailer found
    /// even after recovery, a declared width of zero, ...).
    #[error("format error: {0}")]
    Format(String),

    /// The document is encrypted and no password, or the wrong password, was
    /// supplied.
    #[error("password required or incorrect")]
    Password,

    /// The document's `/Encrypt` dictionary names a revision or algorithm
    /// this crate does not implement.
    #[error("unsupported security handler: {0}")]
    Security(String),

    /// A documented cap was exceeded (nesting depth, cache size, xref chain
    /// length, object-stream member count).
    #[error("limit exceeded: {0}")]
    Limit(&'static str),

    /// A soft error: one object or stream could not be decoded, but the
    /// document as a whole remains usable. Carries a diagnostic message and,
    /// where known, the object number that failed.
    #[error("corrupt object{}: {message}", objid.map(|n| format!(" {n}")).unwrap_or_default())]
    Corrupt {
        objid: Option<u32>,
        message: String,
    },
}

impl PdfError {
    pub fn corrupt(message: impl Into<String>) -> Self {
        PdfError::Corrupt {
            objid: None,
            message: message.into(),
        }
    }

    pub fn corrupt_obj(objid: u32, message: impl Into<String>) -> Self {
        PdfError::Corrupt {
            objid: Some(objid),
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PdfError>;
