//! The document layer: byte sources, cross-reference resolution,
//! security handlers, the page tree, and the `Document` type that ties
//! them together (§4.1, §4.4, §4.5, §4.7, §4.10).

pub mod bytesource;
pub mod document;
pub mod metadata;
pub mod page;
pub mod saslprep;
pub mod security;
pub mod xref;

pub use bytesource::{ByteSource, MmapSource, SliceSource};
pub use document::Document;
pub use metadata::{Annotation, FormField, InteractiveForm, NameTree, NumberTree, PageLabelStyle};
pub use page::Page;
pub use security::PDFSecurityHandler;
pub use xref::{CrossRefIndex, XRefLocation, XRefSection};
