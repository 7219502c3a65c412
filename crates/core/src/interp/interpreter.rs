//! ContentInterpreter (§4.7): executes a tokenized operator stream over a
//! GraphicsStateStack, emitting PageElements to a sink.

use std::ops::ControlFlow;

use tracing::warn;

use crate::error::Result;
use crate::interp::element::{FillRule, FontRef, PageElement, PathSegment, PlacedGlyph};
use crate::interp::sink::{PageElementSink, PauseCheck};
use crate::interp::state::GraphicsStateStack;
use crate::model::{mult_matrix, Dictionary, Matrix, PDFColorSpace, PDFFunction, PDFObjRef, PDFObject, PDFStream};
use crate::parser::content_lexer::{tokenize_content, ContentOp};

/// Recursion bound for nested form-XObject invocation (§4.7).
pub const MAX_FORM_DEPTH: u32 = 32;

/// What the interpreter needs from its owning `Document` to resolve named
/// resources and decode stream payloads. Implemented by `Document` itself;
/// kept as a trait here so `interp` has no upward dependency on `document`.
pub trait ObjectResolver {
    fn resolve(&self, obj: &PDFObject) -> Result<PDFObject>;
    fn decode_stream(&self, stream: &PDFStream) -> Result<Vec<u8>>;
}

fn num(obj: &PDFObject) -> f64 {
    obj.as_num().unwrap_or(0.0)
}

pub struct ContentInterpreter<'a> {
    resolver: &'a dyn ObjectResolver,
    resources: Dictionary,
    gstate: GraphicsStateStack,
    curpath: Vec<PathSegment>,
    current_point: (f64, f64),
    path_start: (f64, f64),
    pending_clip: Option<FillRule>,
    compat_depth: u32,
    form_depth: u32,
}

impl<'a> ContentInterpreter<'a> {
    pub fn new(resolver: &'a dyn ObjectResolver, resources: Dictionary) -> Self {
        Self {
            resolver,
            resources,
            gstate: GraphicsStateStack::default(),
            curpath: Vec::new(),
            current_point: (0.0, 0.0),
            path_start: (0.0, 0.0),
            pending_clip: None,
            compat_depth: 0,
            form_depth: 0,
        }
    }

    /// Run a page's (already-decoded and concatenated) content stream.
    pub fn run(
        &mut self,
        content: &[u8],
        sink: &mut dyn PageElementSink,
        pause: &mut dyn PauseCheck,
    ) -> Result<()> {
        let ops = tokenize_content(content)?;
        self.execute(&ops, sink, pause)
    }

    fn execute(
        &mut self,
        ops: &[ContentOp],
        sink: &mut dyn PageElementSink,
        pause: &mut dyn PauseCheck,
    ) -> Result<()> {
        for op in ops {
            if let ControlFlow::Break(()) = pause.poll() {
                return Ok(());
            }
            self.dispatch(op, sink);
        }
        Ok(())
    }

    fn named_resource(&self, category: &str, name: &str) -> Option<PDFObject> {
        let cat = self.resources.get(category)?;
        let cat = self.resolver.resolve(cat).ok()?;
        let dict = cat.as_dict().ok()?;
        dict.get(name).cloned()
    }

    fn resolve_colorspace(&self, name: &str) -> PDFColorSpace {
        if let Some(builtin) = PDFColorSpace::by_name(name) {
            return builtin;
        }
        if let Some(entry) = self.named_resource("ColorSpace", name) {
            if let Ok(resolved) = self.resolver.resolve(&entry) {
                if let Some(cs) = colorspace_from_object(&resolved, self.resolver) {
                    return cs;
                }
            }
        }
        PDFColorSpace::DeviceGray
    }

    fn ctm(&self) -> Matrix {
        self.gstate.current().ctm
    }

    fn dispatch(&mut self, op: &ContentOp, sink: &mut dyn PageElementSink) {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => self.gstate.push(),
            "Q" => self.gstate.pop(),
            "cm" if operands.len() == 6 => {
                let m = operand_matrix(operands);
                let ctm = self.gstate.current().ctm;
                self.gstate.current_mut().ctm = mult_matrix(ctm, m);
            }

            "m" if operands.len() == 2 => {
                let p = (num(&operands[0]), num(&operands[1]));
                self.curpath.push(PathSegment::MoveTo(p.0, p.1));
                self.current_point = p;
                self.path_start = p;
            }
            "l" if operands.len() == 2 => {
                let p = (num(&operands[0]), num(&operands[1]));
                self.curpath.push(PathSegment::LineTo(p.0, p.1));
                self.current_point = p;
            }
            "c" if operands.len() == 6 => {
                let c1 = (num(&operands[0]), num(&operands[1]));
                let c2 = (num(&operands[2]), num(&operands[3]));
                let p = (num(&operands[4]), num(&operands[5]));
                self.curpath.push(PathSegment::CurveTo(c1, c2, p));
                self.current_point = p;
            }
            "v" if operands.len() == 4 => {
                let c2 = (num(&operands[0]), num(&operands[1]));
                let p = (num(&operands[2]), num(&operands[3]));
                self.curpath.push(PathSegment::CurveTo(self.current_point, c2, p));
                self.current_point = p;
            }
            "y" if operands.len() == 4 => {
                let c1 = (num(&operands[0]), num(&operands[1]));
                let p = (num(&operands[2]), num(&operands[3]));
                self.curpath.push(PathSegment::CurveTo(c1, p, p));
                self.current_point = p;
            }
            "re" if operands.len() == 4 => {
                let (x, y, w, h) = (num(&operands[0]), num(&operands[1]), num(&operands[2]), num(&operands[3]));
                self.curpath.push(PathSegment::MoveTo(x, y));
                self.curpath.push(PathSegment::LineTo(x + w, y));
                self.curpath.push(PathSegment::LineTo(x + w, y + h));
                self.curpath.push(PathSegment::LineTo(x, y + h));
                self.curpath.push(PathSegment::ClosePath);
                self.current_point = (x, y);
                self.path_start = (x, y);
            }
            "h" => {
                self.curpath.push(PathSegment::ClosePath);
                self.current_point = self.path_start;
            }

            "S" => self.paint(sink, false, true, None),
            "s" => {
                self.curpath.push(PathSegment::ClosePath);
                self.paint(sink, false, true, None)
            }
            "f" | "F" => self.paint(sink, true, false, Some(FillRule::NonZero)),
            "f*" => self.paint(sink, true, false, Some(FillRule::EvenOdd)),
            "B" => self.paint(sink, true, true, Some(FillRule::NonZero)),
            "B*" => self.paint(sink, true, true, Some(FillRule::EvenOdd)),
            "b" => {
                self.curpath.push(PathSegment::ClosePath);
                self.paint(sink, true, true, Some(FillRule::NonZero))
            }
            "b*" => {
                self.curpath.push(PathSegment::ClosePath);
                self.paint(sink, true, true, Some(FillRule::EvenOdd))
            }
            "n" => self.paint(sink, false, false, None),

            "W" => self.pending_clip = Some(FillRule::NonZero),
            "W*" => self.pending_clip = Some(FillRule::EvenOdd),

            "CS" if operands.len() == 1 => {
                if let Ok(name) = operands[0].as_name() {
                    let cs = self.resolve_colorspace(name);
                    let gs = self.gstate.current_mut();
                    gs.fill_color = cs.initial_color();
                    gs.fill_cs = cs;
                }
            }
            "cs" if operands.len() == 1 => {
                if let Ok(name) = operands[0].as_name() {
                    let cs = self.resolve_colorspace(name);
                    let gs = self.gstate.current_mut();
                    gs.stroke_color = cs.initial_color();
                    gs.stroke_cs = cs;
                }
            }
            "SC" | "SCN" => self.set_color(operands, true),
            "sc" | "scn" => self.set_color(operands, false),
            "G" if operands.len() == 1 => {
                let gs = self.gstate.current_mut();
                gs.stroke_cs = PDFColorSpace::DeviceGray;
                gs.stroke_color = vec![num(&operands[0])];
            }
            "g" if operands.len() == 1 => {
                let gs = self.gstate.current_mut();
                gs.fill_cs = PDFColorSpace::DeviceGray;
                gs.fill_color = vec![num(&operands[0])];
            }
            "RG" if operands.len() == 3 => {
                let gs = self.gstate.current_mut();
                gs.stroke_cs = PDFColorSpace::DeviceRGB;
                gs.stroke_color = operands.iter().map(num).collect();
            }
            "rg" if operands.len() == 3 => {
                let gs = self.gstate.current_mut();
                gs.fill_cs = PDFColorSpace::DeviceRGB;
                gs.fill_color = operands.iter().map(num).collect();
            }
            "K" if operands.len() == 4 => {
                let gs = self.gstate.current_mut();
                gs.stroke_cs = PDFColorSpace::DeviceCMYK;
                gs.stroke_color = operands.iter().map(num).collect();
            }
            "k" if operands.len() == 4 => {
                let gs = self.gstate.current_mut();
                gs.fill_cs = PDFColorSpace::DeviceCMYK;
                gs.fill_color = operands.iter().map(num).collect();
            }

            "BT" => {
                let t = &mut self.gstate.current_mut().text;
                t.tm = crate::model::MATRIX_IDENTITY;
                t.tlm = crate::model::MATRIX_IDENTITY;
            }
            "ET" => {}
            "Tc" if operands.len() == 1 => self.gstate.current_mut().text.char_spacing = num(&operands[0]),
            "Tw" if operands.len() == 1 => self.gstate.current_mut().text.word_spacing = num(&operands[0]),
            "Tz" if operands.len() == 1 => self.gstate.current_mut().text.h_scale = num(&operands[0]) / 100.0,
            "TL" if operands.len() == 1 => self.gstate.current_mut().text.leading = num(&operands[0]),
            "Ts" if operands.len() == 1 => self.gstate.current_mut().text.rise = num(&operands[0]),
            "Tr" if operands.len() == 1 => self.gstate.current_mut().text.render_mode = operands[0].as_int().unwrap_or(0),
            "Tf" if operands.len() == 2 => {
                if let Ok(name) = operands[0].as_name() {
                    let objref = self.named_resource("Font", name).and_then(|o| o.as_ref().ok());
                    let t = &mut self.gstate.current_mut().text;
                    t.font = Some(FontRef { resource_name: name.to_string(), objref });
                    t.size = num(&operands[1]);
                }
            }
            "Tm" if operands.len() == 6 => {
                let m = operand_matrix(operands);
                let t = &mut self.gstate.current_mut().text;
                t.tm = m;
                t.tlm = m;
            }
            "Td" if operands.len() == 2 => self.text_move(num(&operands[0]), num(&operands[1])),
            "TD" if operands.len() == 2 => {
                self.gstate.current_mut().text.leading = -num(&operands[1]);
                self.text_move(num(&operands[0]), num(&operands[1]));
            }
            "T*" => {
                let leading = self.gstate.current().text.leading;
                self.text_move(0.0, -leading);
            }
            "Tj" if operands.len() == 1 => self.show_text(&operands[0], sink),
            "'" if operands.len() == 1 => {
                let leading = self.gstate.current().text.leading;
                self.text_move(0.0, -leading);
                self.show_text(&operands[0], sink);
            }
            "\"" if operands.len() == 3 => {
                self.gstate.current_mut().text.word_spacing = num(&operands[0]);
                self.gstate.current_mut().text.char_spacing = num(&operands[1]);
                let leading = self.gstate.current().text.leading;
                self.text_move(0.0, -leading);
                self.show_text(&operands[2], sink);
            }
            "TJ" if operands.len() == 1 => {
                if let Ok(arr) = operands[0].as_array() {
                    let arr = arr.clone();
                    for item in &arr {
                        match item {
                            PDFObject::String { .. } => self.show_text(item, sink),
                            _ => {
                                let adj = item.as_num().unwrap_or(0.0);
                                let t = &mut self.gstate.current_mut().text;
                                let dx = -adj / 1000.0 * t.size * t.h_scale;
                                t.tm = crate::model::geom::mult_matrix(t.tm, (1.0, 0.0, 0.0, 1.0, dx, 0.0));
                            }
                        }
                    }
                }
            }

            "Do" if operands.len() == 1 => {
                if let Ok(name) = operands[0].as_name() {
                    self.do_xobject(name, sink);
                }
            }
            "gs" if operands.len() == 1 => {
                if let Ok(name) = operands[0].as_name() {
                    self.apply_extgstate(name);
                }
            }
            "sh" if operands.len() == 1 => {
                if let Ok(name) = operands[0].as_name() {
                    sink.push(PageElement::Shading { resource_name: name.to_string() });
                }
            }
            "BI" if operands.len() == 2 => {
                if let (Ok(dict), Ok(data)) = (operands[0].as_dict(), operands[1].as_string()) {
                    sink.push(PageElement::InlineImage {
                        params: dict.clone(),
                        data: data.to_vec(),
                        ctm: self.ctm(),
                    });
                }
            }

            "BMC" if operands.len() == 1 => self.marked_content(operands, sink, false),
            "BDC" if operands.len() == 2 => self.marked_content(operands, sink, true),
            "EMC" => sink.push(PageElement::MarkedContent { tag: "EMC".into(), has_properties: false }),
            "MP" if operands.len() == 1 => self.marked_content(operands, sink, false),
            "DP" if operands.len() == 2 => self.marked_content(operands, sink, true),

            "BX" => self.compat_depth += 1,
            "EX" => self.compat_depth = self.compat_depth.saturating_sub(1),

            other => {
                if self.compat_depth == 0 {
                    warn!("unknown content operator {other}, operands cleared");
                }
            }
        }
    }

    fn marked_content(&mut self, operands: &[PDFObject], sink: &mut dyn PageElementSink, has_properties: bool) {
        let tag = operands[0].as_name().unwrap_or("").to_string();
        sink.push(PageElement::MarkedContent { tag, has_properties });
    }

    fn text_move(&mut self, tx: f64, ty: f64) {
        let t = &mut self.gstate.current_mut().text;
        t.tlm = crate::model::geom::mult_matrix(t.tlm, (1.0, 0.0, 0.0, 1.0, tx, ty));
        t.tm = t.tlm;
    }

    fn set_color(&mut self, operands: &[PDFObject], stroke: bool) {
        let (nums, pattern): (Vec<f64>, Option<String>) = match operands.last() {
            Some(PDFObject::Name(n)) => (operands[..operands.len() - 1].iter().map(num).collect(), Some(n.clone())),
            _ => (operands.iter().map(num).collect(), None),
        };
        let gs = self.gstate.current_mut();
        if stroke {
            if !nums.is_empty() {
                gs.stroke_color = nums;
            }
            if pattern.is_some() {
                gs.stroke_pattern = pattern;
            }
        } else {
            if !nums.is_empty() {
                gs.fill_color = nums;
            }
            if pattern.is_some() {
                gs.fill_pattern = pattern;
            }
        }
    }

    fn paint(&mut self, sink: &mut dyn PageElementSink, fill: bool, stroke: bool, fill_rule: Option<FillRule>) {
        if !self.curpath.is_empty() {
            let ctm = self.ctm();
            if fill {
                let gs = self.gstate.current();
                let color = gs.fill_cs.to_rgb(&gs.fill_color);
                sink.push(PageElement::FilledPath {
                    segments: self.curpath.clone(),
                    rule: fill_rule.unwrap_or(FillRule::NonZero),
                    color,
                    ctm,
                });
            }
            if stroke {
                let gs = self.gstate.current();
                let color = gs.stroke_cs.to_rgb(&gs.stroke_color);
                sink.push(PageElement::StrokedPath {
                    segments: self.curpath.clone(),
                    color,
                    line_width: gs.line_width,
                    ctm,
                });
            }
        }
        if let Some(rule) = self.pending_clip.take() {
            if !self.curpath.is_empty() {
                self.gstate.current_mut().clip = Some(self.curpath.clone());
                sink.push(PageElement::ClipPush { segments: self.curpath.clone(), rule });
            }
        }
        self.curpath.clear();
    }

    fn font_width_1000(&self, font: &FontRef, code: u32) -> f64 {
        let Some(objref) = &font.objref else { return 500.0 };
        let Ok(resolved) = self.resolver.resolve(&PDFObject::Ref(objref.clone())) else { return 500.0 };
        let Ok(dict) = resolved.as_dict() else { return 500.0 };
        let first_char = dict.get("FirstChar").and_then(|v| v.as_int().ok()).unwrap_or(0);
        if let Some(PDFObject::Array(widths)) = dict.get("Widths") {
            let idx = code as i64 - first_char;
            if idx >= 0 {
                if let Some(w) = widths.get(idx as usize).and_then(|w| w.as_num().ok()) {
                    return w;
                }
            }
        }
        dict.get("MissingWidth").and_then(|v| v.as_num().ok()).unwrap_or(500.0)
    }

    fn show_text(&mut self, obj: &PDFObject, sink: &mut dyn PageElementSink) {
        let Ok(bytes) = obj.as_string() else { return };
        let bytes = bytes.to_vec();
        let font = self.gstate.current().text.font.clone();
        let Some(font) = font else { return };
        let mut glyphs = Vec::with_capacity(bytes.len());
        for &byte in &bytes {
            let t = &mut self.gstate.current_mut().text;
            let origin = crate::model::geom::apply_matrix_pt(mult_matrix(self.ctm(), t.tm), (0.0, t.rise));
            let w1000 = self.font_width_1000(&font, byte as u32);
            let advance = (w1000 / 1000.0 * t.size + t.char_spacing
                + if byte == 0x20 { t.word_spacing } else { 0.0 })
                * t.h_scale;
            glyphs.push(PlacedGlyph { code: byte as u32, origin, advance });
            t.tm = crate::model::geom::mult_matrix(t.tm, (1.0, 0.0, 0.0, 1.0, advance, 0.0));
        }
        let t = &self.gstate.current().text;
        sink.push(PageElement::PlacedText {
            font,
            size: t.size,
            glyphs,
            render_mode: t.render_mode,
            ctm: self.ctm(),
        });
    }

    fn apply_extgstate(&mut self, name: &str) {
        let Some(entry) = self.named_resource("ExtGState", name) else { return };
        let Ok(resolved) = self.resolver.resolve(&entry) else { return };
        let Ok(dict) = resolved.as_dict() else { return };
        let gs = self.gstate.current_mut();
        if let Some(lw) = dict.get("LW").and_then(|v| v.as_num().ok()) {
            gs.line_width = lw;
        }
        if let Some(lc) = dict.get("LC").and_then(|v| v.as_int().ok()) {
            gs.line_cap = lc;
        }
        if let Some(lj) = dict.get("LJ").and_then(|v| v.as_int().ok()) {
            gs.line_join = lj;
        }
        if let Some(ml) = dict.get("ML").and_then(|v| v.as_num().ok()) {
            gs.miter_limit = ml;
        }
        if let Some(ca) = dict.get("ca").and_then(|v| v.as_num().ok()) {
            gs.fill_alpha = ca;
        }
        if let Some(ca) = dict.get("CA").and_then(|v| v.as_num().ok()) {
            gs.stroke_alpha = ca;
        }
    }

    fn do_xobject(&mut self, name: &str, sink: &mut dyn PageElementSink) {
        let Some(entry) = self.resources.get("XObject").cloned() else { return };
        let Ok(resolved_cat) = self.resolver.resolve(&entry) else { return };
        let Ok(cat) = resolved_cat.as_dict() else { return };
        let Some(raw_entry) = cat.get(name) else { return };
        let objref = raw_entry.as_ref().ok();
        let Ok(resolved) = self.resolver.resolve(raw_entry) else { return };
        let Ok(stream) = resolved.as_stream() else { return };
        let subtype = stream.attrs.get("Subtype").and_then(|s| s.as_name().ok()).unwrap_or("");

        if subtype == "Image" {
            if let Some(objref) = objref {
                sink.push(PageElement::PlacedImage { xobject: objref, resource_name: name.to_string(), ctm: self.ctm() });
            }
            return;
        }

        if subtype != "Form" {
            return;
        }
        if self.form_depth >= MAX_FORM_DEPTH {
            warn!("form XObject nesting exceeds {MAX_FORM_DEPTH}, eliding Do {name}");
            return;
        }
        let Some(objref) = objref else { return };
        let matrix = stream
            .attrs
            .get("Matrix")
            .and_then(|m| m.as_array().ok())
            .filter(|a| a.len() == 6)
            .map(|a| operand_matrix(a))
            .unwrap_or(crate::model::MATRIX_IDENTITY);
        let Ok(content) = self.resolver.decode_stream(stream) else { return };
        let form_resources = stream
            .attrs
            .get("Resources")
            .and_then(|r| self.resolver.resolve(r).ok())
            .and_then(|r| r.as_dict().ok().cloned())
            .unwrap_or_else(|| self.resources.clone());

        sink.push(PageElement::FormInvocation { resource_name: name.to_string(), objref, matrix });

        self.gstate.push();
        let ctm = self.gstate.current().ctm;
        self.gstate.current_mut().ctm = mult_matrix(ctm, matrix);
        let saved_resources = std::mem::replace(&mut self.resources, form_resources);
        self.form_depth += 1;

        if let Ok(ops) = tokenize_content(&content) {
            let mut noop_pause = crate::interp::sink::NeverPause;
            let _ = self.execute(&ops, sink, &mut noop_pause);
        }

        self.form_depth -= 1;
        self.resources = saved_resources;
        self.gstate.pop();
    }
}

fn operand_matrix(operands: &[PDFObject]) -> Matrix {
    (num(&operands[0]), num(&operands[1]), num(&operands[2]), num(&operands[3]), num(&operands[4]), num(&operands[5]))
}

fn colorspace_from_object(obj: &PDFObject, resolver: &dyn ObjectResolver) -> Option<PDFColorSpace> {
    match obj {
        PDFObject::Name(n) => PDFColorSpace::by_name(n),
        PDFObject::Array(arr) => {
            let family = arr.first()?.as_name().ok()?;
            match family {
                "ICCBased" => Some(PDFColorSpace::ICCBased { n: 3, fallback: Box::new(PDFColorSpace::DeviceRGB) }),
                "Indexed" if arr.len() >= 4 => {
                    let base = colorspace_from_object(&arr[1], resolver)?;
                    let hival = arr[2].as_int().ok()? as u32;
                    let lookup = arr[3].as_string().ok()?.to_vec();
                    Some(PDFColorSpace::Indexed { base: Box::new(base), hival, lookup })
                }
                "Separation" | "DeviceN" if arr.len() >= 4 => {
                    let names = match family {
                        "Separation" => vec![arr[1].as_name().ok()?.to_string()],
                        _ => resolver
                            .resolve(&arr[1])
                            .ok()?
                            .as_array()
                            .ok()?
                            .iter()
                            .map(|n| n.as_name().map(str::to_string))
                            .collect::<Result<Vec<_>>>()
                            .ok()?,
                    };
                    let alt_obj = resolver.resolve(&arr[2]).ok()?;
                    let alternate = Box::new(colorspace_from_object(&alt_obj, resolver)?);
                    let resolve = |o: &PDFObject| resolver.resolve(o);
                    let decode_stream = |s: &PDFStream| resolver.decode_stream(s);
                    let tint_transform = Box::new(PDFFunction::from_object(&arr[3], &resolve, &decode_stream).ok()?);
                    Some(if family == "DeviceN" {
                        PDFColorSpace::DeviceN { names, alternate, tint_transform }
                    } else {
                        PDFColorSpace::Separation { names, alternate, tint_transform }
                    })
                }
                other => PDFColorSpace::by_name(other),
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullResolver;
    impl ObjectResolver for NullResolver {
        fn resolve(&self, obj: &PDFObject) -> Result<PDFObject> {
            Ok(obj.clone())
        }
        fn decode_stream(&self, stream: &PDFStream) -> Result<Vec<u8>> {
            Ok(stream.rawdata_bytes().to_vec())
        }
    }

    fn run(content: &[u8]) -> Vec<PageElement> {
        let resolver = NullResolver;
        let mut interp = ContentInterpreter::new(&resolver, Dictionary::new());
        let mut elements = Vec::new();
        let mut pause = crate::interp::sink::NeverPause;
        interp.run(content, &mut elements, &mut pause).unwrap();
        elements
    }

    #[test]
    fn two_rectangles_emit_fill_then_stroke() {
        let elements = run(b"10 20 100 50 re f 200 300 80 80 re S");
        assert_eq!(elements.len(), 2);
        assert!(matches!(elements[0], PageElement::FilledPath { .. }));
        assert!(matches!(elements[1], PageElement::StrokedPath { .. }));
    }

    #[test]
    fn q_q_balance_restores_depth() {
        let resolver = NullResolver;
        let mut interp = ContentInterpreter::new(&resolver, Dictionary::new());
        let initial_depth = interp.gstate.depth();
        let mut elements = Vec::new();
        let mut pause = crate::interp::sink::NeverPause;
        interp
            .run(b"q 2 0 0 2 0 0 cm q 1 0 0 1 50 50 cm Q Q", &mut elements, &mut pause)
            .unwrap();
        assert!(elements.is_empty());
        assert_eq!(interp.gstate.depth(), initial_depth);
    }

    #[test]
    fn unknown_operator_does_not_disturb_surrounding_elements() {
        let elements = run(b"1 2 zzz 10 20 100 50 re f");
        assert_eq!(elements.len(), 1);
        assert!(matches!(elements[0], PageElement::FilledPath { .. }));
    }
}
