//! The PDF value model: objects, color spaces, and PDF function objects.

pub mod color;
pub mod function;
pub mod geom;
pub mod objects;

pub use color::PDFColorSpace;
pub use function::PDFFunction;
pub use geom::{Matrix, Point, Rect, MATRIX_IDENTITY};
pub use objects::{Dictionary, PDFObjRef, PDFObject, PDFStream};
