//! Affine geometry: the 3×2 CTM and the rectangles it transforms.
//!
//! Port of the matrix routines in pdfminer.six `utils.py`.

/// A point `(x, y)`.
pub type Point = (f64, f64);

/// A rectangle `(x0, y0, x1, y1)`, lower-left then upper-right.
pub type Rect = (f64, f64, f64, f64);

/// A 6-element affine transform `(a, b, c, d, e, f)`.
/// Transforms `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
pub type Matrix = (f64, f64, f64, f64, f64, f64);

pub const MATRIX_IDENTITY: Matrix = (1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

/// `m1 * m0`: applies `m0` first, then `m1`.
pub fn mult_matrix(m1: Matrix, m0: Matrix) -> Matrix {
    let (a1, b1, c1, d1, e1, f1) = m1;
    let (a0, b0, c0, d0, e0, f0) = m0;
    (
        a0 * a1 + c0 * b1,
        b0 * a1 + d0 * b1,
        a0 * c1 + c0 * d1,
        b0 * c1 + d0 * d1,
        a0 * e1 + c0 * f1 + e0,
        b0 * e1 + d0 * f1 + f0,
    )
}

pub fn apply_matrix_pt(m: Matrix, v: Point) -> Point {
    let (a, b, c, d, e, f) = m;
    let (x, y) = v;
    (a * x + c * y + e, b * x + d * y + f)
}

/// The axis-aligned bounding box of `rect` under `m` — not a rotated
/// rectangle, but the tightest upright box containing the rotated corners.
pub fn apply_matrix_rect(m: Matrix, rect: Rect) -> Rect {
    let (x0, y0, x1, y1) = rect;
    let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)].map(|p| apply_matrix_pt(m, p));
    let xs = corners.map(|(x, _)| x);
    let ys = corners.map(|(_, y)| y);
    (
        xs.into_iter().fold(f64::MAX, f64::min),
        ys.into_iter().fold(f64::MAX, f64::min),
        xs.into_iter().fold(f64::MIN, f64::max),
        ys.into_iter().fold(f64::MIN, f64::max),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_leaves_point_unchanged() {
        assert_eq!(apply_matrix_pt(MATRIX_IDENTITY, (3.0, 4.0)), (3.0, 4.0));
    }

    #[test]
    fn translate_then_scale_composes() {
        let translate = (1.0, 0.0, 0.0, 1.0, 10.0, 0.0);
        let scale = (2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        // scale applied first, then translate.
        let combined = mult_matrix(translate, scale);
        assert_eq!(apply_matrix_pt(combined, (1.0, 1.0)), (12.0, 2.0));
    }

    #[test]
    fn rect_under_rotation_is_axis_aligned_bbox() {
        // 90-degree rotation.
        let rot: Matrix = (0.0, 1.0, -1.0, 0.0, 0.0, 0.0);
        let r = apply_matrix_rect(rot, (0.0, 0.0, 10.0, 20.0));
        assert_eq!(r, (-20.0, 0.0, 0.0, 10.0));
    }
}
