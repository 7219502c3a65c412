//! The crate's public, stable surface (§6): `DocumentOptions` and the
//! `Document`/`Page` handles re-exported at the crate root.

pub mod options;

pub use options::{DocumentOptions, DocumentOptionsBuilder};
