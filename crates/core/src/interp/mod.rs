//! Content-stream interpretation: graphics state, the PageElement output
//! sum, and the ContentInterpreter itself (§4.7, §4.8).

pub mod element;
pub mod interpreter;
pub mod sink;
pub mod state;

pub use element::{FillRule, FontRef, PageElement, PathSegment, PlacedGlyph};
pub use interpreter::{ContentInterpreter, ObjectResolver, MAX_FORM_DEPTH};
pub use sink::{NeverPause, PageElementSink, PauseCheck};
pub use state::{GraphicsState, GraphicsStateStack, TextState, MAX_GSTACK_DEPTH};
