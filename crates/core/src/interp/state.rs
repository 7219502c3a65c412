//! GraphicsState and the q/Q stack (§3, §4.7).

use tracing::warn;

use crate::interp::element::{FontRef, PathSegment};
use crate::model::{Matrix, PDFColorSpace, MATRIX_IDENTITY};

/// Depth beyond which `q` is refused — matching the form-XObject and
/// nesting caps elsewhere in the crate.
pub const MAX_GSTACK_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub struct TextState {
    pub font: Option<FontRef>,
    pub size: f64,
    pub char_spacing: f64,
    pub word_spacing: f64,
    pub leading: f64,
    pub render_mode: i64,
    pub rise: f64,
    pub h_scale: f64,
    /// Text matrix, set by `Tm`/`Td`/`TD`/`T*` and reset at `BT`.
    pub tm: Matrix,
    /// Text line matrix, the anchor `Td`/`TD`/`T*` translate from.
    pub tlm: Matrix,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            leading: 0.0,
            render_mode: 0,
            rise: 0.0,
            h_scale: 1.0,
            tm: MATRIX_IDENTITY,
            tlm: MATRIX_IDENTITY,
        }
    }
}

/// One saveable graphics-state record. Cloned wholesale by `q`.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    pub ctm: Matrix,
    pub fill_cs: PDFColorSpace,
    pub stroke_cs: PDFColorSpace,
    pub fill_color: Vec<f64>,
    pub stroke_color: Vec<f64>,
    pub line_width: f64,
    pub line_cap: i64,
    pub line_join: i64,
    pub miter_limit: f64,
    pub dash_pattern: (Vec<f64>, f64),
    pub fill_alpha: f64,
    pub stroke_alpha: f64,
    /// The clip path in effect, described abstractly as a path (§3). `None`
    /// means "the page boundary" — no clip has been installed yet.
    pub clip: Option<Vec<PathSegment>>,
    pub fill_pattern: Option<String>,
    pub stroke_pattern: Option<String>,
    pub text: TextState,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: MATRIX_IDENTITY,
            fill_cs: PDFColorSpace::DeviceGray,
            stroke_cs: PDFColorSpace::DeviceGray,
            fill_color: vec![0.0],
            stroke_color: vec![0.0],
            line_width: 1.0,
            line_cap: 0,
            line_join: 0,
            miter_limit: 10.0,
            dash_pattern: (Vec::new(), 0.0),
            fill_alpha: 1.0,
            stroke_alpha: 1.0,
            clip: None,
            fill_pattern: None,
            stroke_pattern: None,
            text: TextState::default(),
        }
    }
}

/// The `q`/`Q` stack. Always has at least one (the current) state.
#[derive(Debug, Clone)]
pub struct GraphicsStateStack {
    states: Vec<GraphicsState>,
}

impl Default for GraphicsStateStack {
    fn default() -> Self {
        Self { states: vec![GraphicsState::default()] }
    }
}

impl GraphicsStateStack {
    pub fn new(initial: GraphicsState) -> Self {
        Self { states: vec![initial] }
    }

    pub fn current(&self) -> &GraphicsState {
        self.states.last().expect("stack is never empty")
    }

    pub fn current_mut(&mut self) -> &mut GraphicsState {
        self.states.last_mut().expect("stack is never empty")
    }

    /// Depth of the stack — matches the initial depth once all `q`s are
    /// balanced by `Q`s (the interpreter's q/Q-balance invariant, §8).
    pub fn depth(&self) -> usize {
        self.states.len()
    }

    /// `q`. Overflow beyond `MAX_GSTACK_DEPTH` is a recoverable error: the
    /// push is refused and a warning logged, matching §4.7's "overflow...
    /// recoverable errors."
    pub fn push(&mut self) {
        if self.states.len() >= MAX_GSTACK_DEPTH {
            warn!("graphics state stack overflow ({} deep), ignoring q", self.states.len());
            return;
        }
        let top = self.current().clone();
        self.states.push(top);
    }

    /// `Q`. Underflow (popping the last state) is refused, matching the
    /// same recoverable-error contract as overflow.
    pub fn pop(&mut self) {
        if self.states.len() <= 1 {
            warn!("graphics state stack underflow, ignoring Q");
            return;
        }
        self.states.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_restores_prior_state() {
        let mut stack = GraphicsStateStack::default();
        stack.current_mut().line_width = 5.0;
        stack.push();
        stack.current_mut().line_width = 9.0;
        assert_eq!(stack.current().line_width, 9.0);
        stack.pop();
        assert_eq!(stack.current().line_width, 5.0);
    }

    #[test]
    fn underflow_pop_is_a_no_op() {
        let mut stack = GraphicsStateStack::default();
        stack.pop();
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn overflow_push_is_refused() {
        let mut stack = GraphicsStateStack::default();
        for _ in 0..(MAX_GSTACK_DEPTH + 10) {
            stack.push();
        }
        assert_eq!(stack.depth(), MAX_GSTACK_DEPTH);
    }
}
