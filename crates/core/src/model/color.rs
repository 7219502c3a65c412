//! PDF color spaces and device-RGB conversion.
//!
//! Port of pdfminer.six `pdfcolor.py`, extended with the `to_rgb` conversions
//! that a text-extraction-only port never needed but a full reader does.

use crate::model::function::PDFFunction;

/// A PDF color space. Closed sum of the eleven kinds a content stream can
/// name via `CS`/`cs` or via a stream's `/ColorSpace` entry.
#[derive(Debug, Clone, PartialEq)]
pub enum PDFColorSpace {
    DeviceGray,
    DeviceRGB,
    DeviceCMYK,
    CalGray,
    CalRGB { gamma: [f64; 3] },
    Lab { range: [f64; 4] },
    /// ICC profile bytes are kept only as metadata; conversion always uses
    /// `fallback`, per this specification's explicit simplification.
    ICCBased { n: usize, fallback: Box<PDFColorSpace> },
    Indexed {
        base: Box<PDFColorSpace>,
        hival: u32,
        lookup: Vec<u8>,
    },
    Separation {
        names: Vec<String>,
        alternate: Box<PDFColorSpace>,
        tint_transform: Box<PDFFunction>,
    },
    DeviceN {
        names: Vec<String>,
        alternate: Box<PDFColorSpace>,
        tint_transform: Box<PDFFunction>,
    },
    /// Defers painting to the interpreter (a pattern fill has no single RGB
    /// value until the pattern cell is rendered).
    Pattern { underlying: Option<Box<PDFColorSpace>> },
}

fn clamp01(x: f64) -> f64 {
    x.max(0.0).min(1.0)
}

fn to_u8(x: f64) -> u8 {
    (clamp01(x) * 255.0).round() as u8
}

impl PDFColorSpace {
    pub fn component_count(&self) -> usize {
        match self {
            PDFColorSpace::DeviceGray | PDFColorSpace::CalGray => 1,
            PDFColorSpace::DeviceRGB | PDFColorSpace::CalRGB { .. } | PDFColorSpace::Lab { .. } => {
                3
            }
            PDFColorSpace::DeviceCMYK => 4,
            PDFColorSpace::ICCBased { n, .. } => *n,
            PDFColorSpace::Indexed { .. } => 1,
            PDFColorSpace::Separation { names, .. } => names.len().max(1),
            PDFColorSpace::DeviceN { names, .. } => names.len(),
            PDFColorSpace::Pattern { underlying } => {
                underlying.as_ref().map_or(0, |u| u.component_count())
            }
        }
    }

    /// Convert a component tuple in this space to device RGB.
    pub fn to_rgb(&self, components: &[f64]) -> (u8, u8, u8) {
        match self {
            PDFColorSpace::DeviceGray | PDFColorSpace::CalGray => {
                let g = to_u8(components.first().copied().unwrap_or(0.0));
                (g, g, g)
            }
            PDFColorSpace::DeviceRGB | PDFColorSpace::CalRGB { .. } => {
                let r = components.first().copied().unwrap_or(0.0);
                let g = components.get(1).copied().unwrap_or(0.0);
                let b = components.get(2).copied().unwrap_or(0.0);
                (to_u8(r), to_u8(g), to_u8(b))
            }
            PDFColorSpace::DeviceCMYK => {
                let c = components.first().copied().unwrap_or(0.0);
                let m = components.get(1).copied().unwrap_or(0.0);
                let y = components.get(2).copied().unwrap_or(0.0);
                let k = components.get(3).copied().unwrap_or(0.0);
                (
                    to_u8(1.0 - (c + k).min(1.0)),
                    to_u8(1.0 - (m + k).min(1.0)),
                    to_u8(1.0 - (y + k).min(1.0)),
                )
            }
            PDFColorSpace::Lab { range } => lab_to_rgb(components, range),
            PDFColorSpace::ICCBased { fallback, .. } => fallback.to_rgb(components),
            PDFColorSpace::Indexed { base, hival, lookup } => {
                let idx = components.first().copied().unwrap_or(0.0).round() as i64;
                let idx = idx.clamp(0, *hival as i64) as usize;
                let n = base.component_count();
                let start = idx * n;
                if start + n <= lookup.len() {
                    let comps: Vec<f64> = lookup[start..start + n]
                        .iter()
                        .map(|b| *b as f64 / 255.0)
                        .collect();
                    base.to_rgb(&comps)
                } else {
                    (0, 0, 0)
                }
            }
            PDFColorSpace::Separation {
                alternate,
                tint_transform,
                ..
            }
            | PDFColorSpace::DeviceN {
                alternate,
                tint_transform,
                ..
            } => match tint_transform.eval(components) {
                Ok(out) => alternate.to_rgb(&out),
                Err(_) => (0, 0, 0),
            },
            PDFColorSpace::Pattern { underlying } => underlying
                .as_ref()
                .map_or((0, 0, 0), |u| u.to_rgb(components)),
        }
    }

    /// Default color (all-zero components) for this space, used to
    /// initialize graphics state.
    pub fn initial_color(&self) -> Vec<f64> {
        match self {
            PDFColorSpace::Indexed { .. } => vec![0.0],
            _ => vec![0.0; self.component_count().max(1)],
        }
    }

    pub fn by_name(name: &str) -> Option<PDFColorSpace> {
        match name {
            "DeviceGray" | "G" | "CalGray" => Some(PDFColorSpace::DeviceGray),
            "DeviceRGB" | "RGB" | "CalRGB" => Some(PDFColorSpace::DeviceRGB),
            "DeviceCMYK" | "CMYK" => Some(PDFColorSpace::DeviceCMYK),
            "Pattern" => Some(PDFColorSpace::Pattern { underlying: None }),
            _ => None,
        }
    }
}

/// CIE L*a*b* to sRGB, via CIE XYZ (D50 reference white), clamped to range.
fn lab_to_rgb(components: &[f64], range: &[f64; 4]) -> (u8, u8, u8) {
    let l = components.first().copied().unwrap_or(0.0).clamp(0.0, 100.0);
    let a = components
        .get(1)
        .copied()
        .unwrap_or(0.0)
        .clamp(range[0], range[1]);
    let b = components
        .get(2)
        .copied()
        .unwrap_or(0.0)
        .clamp(range[2], range[3]);

    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;
    let finv = |t: f64| {
        if t > 6.0 / 29.0 {
            t * t * t
        } else {
            3.0 * (6.0f64 / 29.0).powi(2) * (t - 4.0 / 29.0)
        }
    };
    let (xn, yn, zn) = (0.9642, 1.0, 0.8249); // D50
    let x = xn * finv(fx);
    let y = yn * finv(fy);
    let z = zn * finv(fz);

    let r = 3.1338561 * x - 1.6168667 * y - 0.4906146 * z;
    let g = -0.9787684 * x + 1.9161415 * y + 0.0334540 * z;
    let b2 = 0.0719453 * x - 0.2289914 * y + 1.4052427 * z;

    let gamma = |c: f64| {
        let c = clamp01(c);
        if c <= 0.0031308 {
            12.92 * c
        } else {
            1.055 * c.powf(1.0 / 2.4) - 0.055
        }
    };
    (to_u8(gamma(r)), to_u8(gamma(g)), to_u8(gamma(b2)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cmyk_black() {
        let cs = PDFColorSpace::DeviceCMYK;
        assert_eq!(cs.to_rgb(&[0.0, 0.0, 0.0, 1.0]), (0, 0, 0));
    }

    #[test]
    fn gray_white() {
        let cs = PDFColorSpace::DeviceGray;
        assert_eq!(cs.to_rgb(&[1.0]), (255, 255, 255));
    }

    #[test]
    fn indexed_looks_up_base() {
        let base = PDFColorSpace::DeviceRGB;
        let cs = PDFColorSpace::Indexed {
            base: Box::new(base),
            hival: 1,
            lookup: vec![0, 0, 0, 255, 255, 255],
        };
        assert_eq!(cs.to_rgb(&[1.0]), (255, 255, 255));
    }

    #[test]
    fn component_counts() {
        assert_eq!(PDFColorSpace::DeviceCMYK.component_count(), 4);
        assert_eq!(PDFColorSpace::DeviceRGB.component_count(), 3);
    }
}
