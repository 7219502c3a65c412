//! PageElement: the content interpreter's output sum type (§4.7, §3).

use crate::model::{Matrix, PDFObjRef};

/// One segment of a path built by `m`/`l`/`c`/`v`/`y`/`re`/`h`.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    /// Cubic Bezier: two control points then the endpoint.
    CurveTo((f64, f64), (f64, f64), (f64, f64)),
    ClosePath,
}

/// Nonzero-winding or even-odd fill rule, selected by `f`/`f*`/`B`/`B*` etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    NonZero,
    EvenOdd,
}

/// A glyph shown by `Tj`/`TJ`/`'`/`"`, with the text-space origin it was
/// placed at (after applying the text matrix and CTM at the time of the show).
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedGlyph {
    pub code: u32,
    pub origin: (f64, f64),
    pub advance: f64,
}

/// A named font resource reference — the resource dictionary key plus the
/// indirect object it resolved to, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct FontRef {
    pub resource_name: String,
    pub objref: Option<PDFObjRef>,
}

/// One unit of interpreter output, emitted to the `PageElementSink` in
/// document order.
#[derive(Debug, Clone, PartialEq)]
pub enum PageElement {
    FilledPath {
        segments: Vec<PathSegment>,
        rule: FillRule,
        color: (u8, u8, u8),
        ctm: Matrix,
    },
    StrokedPath {
        segments: Vec<PathSegment>,
        color: (u8, u8, u8),
        line_width: f64,
        ctm: Matrix,
    },
    PlacedText {
        font: FontRef,
        size: f64,
        glyphs: Vec<PlacedGlyph>,
        render_mode: i64,
        ctm: Matrix,
    },
    PlacedImage {
        xobject: PDFObjRef,
        resource_name: String,
        ctm: Matrix,
    },
    ClipPush {
        segments: Vec<PathSegment>,
        rule: FillRule,
    },
    ClipPop,
    /// A form XObject invocation. The interpreter recurses into the form's
    /// content stream itself; this marker lets the sink observe the
    /// boundary (matching a saved/restored graphics-state snapshot).
    FormInvocation {
        resource_name: String,
        objref: PDFObjRef,
        matrix: Matrix,
    },
    /// `sh` — a named shading pattern painted over the current clip.
    Shading { resource_name: String },
    /// `BI...ID...EI` — an inline image has no XObject identity of its own.
    InlineImage {
        params: crate::model::Dictionary,
        data: Vec<u8>,
        ctm: Matrix,
    },
    /// `BMC`/`BDC`/`EMC`/`MP`/`DP` — structural markers, no visual effect.
    MarkedContent { tag: String, has_properties: bool },
}
