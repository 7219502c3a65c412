//! A PDF reading library: object model, lazy cross-reference resolution,
//! content-stream interpretation, and filter/decryption support.
//!
//! The crate is organized bottom-up: [`parser`] turns bytes into
//! [`model`] values, [`document`] resolves references and walks the page
//! tree, and [`interp`] turns a page's content stream into a sequence of
//! [`interp::PageElement`] values for an external rasterizer to consume.
//! [`codec`] holds the stream filters and cryptographic primitives the
//! other layers call into. [`api`] is the small, stable surface most
//! callers need.

pub mod api;
pub mod codec;
pub mod document;
pub mod error;
pub mod interp;
pub mod model;
pub mod parser;

pub use api::{DocumentOptions, DocumentOptionsBuilder};
pub use document::{Annotation, Document, FormField, InteractiveForm, Page};
pub use error::{PdfError, Result};
pub use interp::{ContentInterpreter, PageElement, PageElementSink, PauseCheck};
pub use model::{Dictionary, PDFColorSpace, PDFObject, PDFObjRef, PDFStream};
