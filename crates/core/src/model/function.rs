//! PDF function objects (ISO 32000-2 §7.10).
//!
//! Used by [`crate::model::color::PDFColorSpace::Separation`] and `DeviceN`
//! to evaluate their tint-transform function, and more generally wherever a
//! PDF dictionary names a `/Function`.

use crate::error::{PdfError, Result};
use crate::model::objects::{PDFObject, PDFStream};

/// One of the four PDF function types.
#[derive(Debug, Clone, PartialEq)]
pub enum PDFFunction {
    /// Type 0: a sampled, multi-dimensional lookup table with linear
    /// interpolation between samples.
    Sampled {
        domain: Vec<(f64, f64)>,
        range: Vec<(f64, f64)>,
        size: Vec<usize>,
        bits_per_sample: u32,
        encode: Vec<(f64, f64)>,
        decode: Vec<(f64, f64)>,
        samples: Vec<u32>,
    },
    /// Type 2: `C0 + x^N * (C1 - C0)`, componentwise.
    Exponential {
        domain: (f64, f64),
        c0: Vec<f64>,
        c1: Vec<f64>,
        n: f64,
    },
    /// Type 3: dispatches to one of several sub-functions by input sub-domain.
    Stitching {
        domain: (f64, f64),
        functions: Vec<PDFFunction>,
        bounds: Vec<f64>,
        encode: Vec<(f64, f64)>,
    },
    /// Type 4: a small stack machine over a restricted PostScript calculator
    /// operator set.
    PostScript {
        domain: Vec<(f64, f64)>,
        range: Vec<(f64, f64)>,
        program: Vec<PsOp>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PsOp {
    Push(f64),
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    Abs,
    Sqrt,
    Dup,
    Pop,
    Exch,
    Cvr,
    Cvi,
    /// `{ ... } { ... } ifelse` / `{ ... } if`, flattened: condition already
    /// consumed, branch taken is chosen at evaluation time by the preceding
    /// comparison operator result.
    If(Vec<PsOp>),
    IfElse(Vec<PsOp>, Vec<PsOp>),
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    And,
    Or,
    Not,
    Truncate,
    Round,
    Index(u32),
    Roll,
}

fn clamp(x: f64, (lo, hi): (f64, f64)) -> f64 {
    x.max(lo.min(hi)).min(lo.max(hi))
}

fn interpolate(x: f64, x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> f64 {
    if (x_max - x_min).abs() < f64::EPSILON {
        return y_min;
    }
    y_min + (x - x_min) * (y_max - y_min) / (x_max - x_min)
}

impl PDFFunction {
    /// Evaluate the function at `inputs`, clamped to its declared domain,
    /// producing one output per declared range entry.
    pub fn eval(&self, inputs: &[f64]) -> Result<Vec<f64>> {
        match self {
            PDFFunction::Sampled {
                domain,
                range,
                size,
                bits_per_sample,
                encode,
                decode,
                samples,
            } => eval_sampled(domain, range, size, *bits_per_sample, encode, decode, samples, inputs),
            PDFFunction::Exponential { domain, c0, c1, n } => {
                let x = clamp(inputs.first().copied().unwrap_or(0.0), *domain);
                let xn = if *n == 1.0 { x } else { x.powf(*n) };
                Ok(c0
                    .iter()
                    .zip(c1.iter())
                    .map(|(a, b)| a + xn * (b - a))
                    .collect())
            }
            PDFFunction::Stitching {
                domain,
                functions,
                bounds,
                encode,
            } => eval_stitching(*domain, functions, bounds, encode, inputs),
            PDFFunction::PostScript {
                domain,
                range,
                program,
            } => eval_postscript(domain, range, program, inputs),
        }
    }
}

impl PDFFunction {
    /// Build a [`PDFFunction`] from a resolved `/Function` entry (a
    /// dictionary for types 2/3, a stream for types 0/4). `resolve` and
    /// `decode_stream` are supplied by the caller so this module stays
    /// independent of the document/interpreter layers that own resolution.
    pub fn from_object(
        obj: &PDFObject,
        resolve: &dyn Fn(&PDFObject) -> Result<PDFObject>,
        decode_stream: &dyn Fn(&PDFStream) -> Result<Vec<u8>>,
    ) -> Result<PDFFunction> {
        let resolved = resolve(obj)?;
        let dict = resolved.as_dict()?;

        let ftype = dict
            .get("FunctionType")
            .ok_or_else(|| PdfError::corrupt("function missing /FunctionType"))?
            .as_int()?;

        match ftype {
            0 => {
                let stream = resolved.as_stream()?;
                let domain = pairs_from(stream.get("Domain"))?;
                let range = pairs_from(stream.get("Range"))?;
                let size: Vec<usize> = stream
                    .get("Size")
                    .ok_or_else(|| PdfError::corrupt("sampled function missing /Size"))?
                    .as_array()?
                    .iter()
                    .map(|v| v.as_int().unwrap_or(1).max(1) as usize)
                    .collect();
                let bits_per_sample = stream
                    .get("BitsPerSample")
                    .ok_or_else(|| PdfError::corrupt("sampled function missing /BitsPerSample"))?
                    .as_int()? as u32;
                let encode = match stream.get("Encode") {
                    Some(e) => pairs_from(Some(e))?,
                    None => size.iter().map(|&s| (0.0, (s.saturating_sub(1)) as f64)).collect(),
                };
                let decode = match stream.get("Decode") {
                    Some(d) => pairs_from(Some(d))?,
                    None => range.clone(),
                };

                let body = decode_stream(stream)?;
                let n = range.len().max(1);
                let sample_count: usize = size.iter().product::<usize>() * n;
                let samples = unpack_samples(&body, bits_per_sample, sample_count);

                Ok(PDFFunction::Sampled {
                    domain,
                    range,
                    size,
                    bits_per_sample,
                    encode,
                    decode,
                    samples,
                })
            }
            2 => {
                let domain = single_pair(dict.get("Domain"))?;
                let c0 = floats_from(dict.get("C0")).unwrap_or_else(|| vec![0.0]);
                let c1 = floats_from(dict.get("C1")).unwrap_or_else(|| vec![1.0]);
                let n = dict
                    .get("N")
                    .ok_or_else(|| PdfError::corrupt("exponential function missing /N"))?
                    .as_num()?;
                Ok(PDFFunction::Exponential { domain, c0, c1, n })
            }
            3 => {
                let domain = single_pair(dict.get("Domain"))?;
                let raw_functions = dict
                    .get("Functions")
                    .ok_or_else(|| PdfError::corrupt("stitching function missing /Functions"))?
                    .as_array()?;
                let functions = raw_functions
                    .iter()
                    .map(|f| PDFFunction::from_object(f, resolve, decode_stream))
                    .collect::<Result<Vec<_>>>()?;
                let bounds = floats_from(dict.get("Bounds")).unwrap_or_default();
                let encode = pairs_from(dict.get("Encode"))?;
                Ok(PDFFunction::Stitching {
                    domain,
                    functions,
                    bounds,
                    encode,
                })
            }
            4 => {
                let stream = resolved.as_stream()?;
                let domain = pairs_from(stream.get("Domain"))?;
                let range = pairs_from(stream.get("Range"))?;
                let body = decode_stream(stream)?;
                let source = String::from_utf8_lossy(&body);
                let program = parse_postscript(&source)?;
                Ok(PDFFunction::PostScript { domain, range, program })
            }
            other => Err(PdfError::corrupt(format!("unsupported /FunctionType {other}"))),
        }
    }
}

fn floats_from(obj: Option<&PDFObject>) -> Option<Vec<f64>> {
    let arr = obj?.as_array().ok()?;
    arr.iter().map(|v| v.as_num().ok()).collect()
}

fn pairs_from(obj: Option<&PDFObject>) -> Result<Vec<(f64, f64)>> {
    let arr = obj
        .ok_or_else(|| PdfError::corrupt("function missing required array entry"))?
        .as_array()?;
    if arr.len() % 2 != 0 {
        return Err(PdfError::corrupt("domain/range-shaped array has odd length"));
    }
    arr.chunks(2)
        .map(|pair| Ok((pair[0].as_num()?, pair[1].as_num()?)))
        .collect()
}

fn single_pair(obj: Option<&PDFObject>) -> Result<(f64, f64)> {
    let pairs = pairs_from(obj)?;
    pairs
        .into_iter()
        .next()
        .ok_or_else(|| PdfError::corrupt("expected a single domain pair"))
}

fn unpack_samples(data: &[u8], bits: u32, count: usize) -> Vec<u32> {
    let mut out = Vec::with_capacity(count);
    let mut bit_pos = 0usize;
    for _ in 0..count {
        let mut value: u32 = 0;
        for _ in 0..bits {
            let byte = bit_pos / 8;
            let bit_in_byte = 7 - (bit_pos % 8);
            let bit = if byte < data.len() { (data[byte] >> bit_in_byte) & 1 } else { 0 };
            value = (value << 1) | bit as u32;
            bit_pos += 1;
        }
        out.push(value);
    }
    out
}

/// Tokenize a PostScript calculator program: `{`/`}` are always their own
/// token even when not surrounded by whitespace.
fn tokenize_ps(src: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut cur = String::new();
    for ch in src.chars() {
        match ch {
            '{' | '}' => {
                if !cur.is_empty() {
                    tokens.push(std::mem::take(&mut cur));
                }
                tokens.push(ch.to_string());
            }
            c if c.is_whitespace() => {
                if !cur.is_empty() {
                    tokens.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() {
        tokens.push(cur);
    }
    tokens
}

fn parse_postscript(src: &str) -> Result<Vec<PsOp>> {
    let tokens = tokenize_ps(src);
    let mut pos = 0;
    // The whole program is itself a `{ ... }` procedure; skip its braces.
    if tokens.first().map(String::as_str) == Some("{") {
        pos = 1;
    }
    parse_ps_block(&tokens, &mut pos)
}

fn parse_ps_block(tokens: &[String], pos: &mut usize) -> Result<Vec<PsOp>> {
    let mut ops = Vec::new();
    let mut pending_procs: Vec<Vec<PsOp>> = Vec::new();

    while *pos < tokens.len() {
        let tok = tokens[*pos].as_str();
        match tok {
            "}" => {
                *pos += 1;
                return Ok(ops);
            }
            "{" => {
                *pos += 1;
                let proc = parse_ps_block(tokens, pos)?;
                pending_procs.push(proc);
            }
            "if" => {
                *pos += 1;
                let body = pending_procs
                    .pop()
                    .ok_or_else(|| PdfError::corrupt("postscript: if with no procedure"))?;
                ops.push(PsOp::If(body));
            }
            "ifelse" => {
                *pos += 1;
                let else_body = pending_procs
                    .pop()
                    .ok_or_else(|| PdfError::corrupt("postscript: ifelse missing else procedure"))?;
                let then_body = pending_procs
                    .pop()
                    .ok_or_else(|| PdfError::corrupt("postscript: ifelse missing then procedure"))?;
                ops.push(PsOp::IfElse(then_body, else_body));
            }
            "index" => {
                *pos += 1;
                match ops.pop() {
                    Some(PsOp::Push(n)) => ops.push(PsOp::Index(n as u32)),
                    _ => return Err(PdfError::corrupt("postscript: index requires a literal count")),
                }
            }
            _ => {
                if let Ok(n) = tok.parse::<f64>() {
                    ops.push(PsOp::Push(n));
                } else {
                    ops.push(ps_op_for(tok)?);
                }
                *pos += 1;
            }
        }
    }

    Ok(ops)
}

fn ps_op_for(name: &str) -> Result<PsOp> {
    Ok(match name {
        "add" => PsOp::Add,
        "sub" => PsOp::Sub,
        "mul" => PsOp::Mul,
        "div" => PsOp::Div,
        "neg" => PsOp::Neg,
        "abs" => PsOp::Abs,
        "sqrt" => PsOp::Sqrt,
        "dup" => PsOp::Dup,
        "pop" => PsOp::Pop,
        "exch" => PsOp::Exch,
        "cvr" => PsOp::Cvr,
        "cvi" => PsOp::Cvi,
        "truncate" => PsOp::Truncate,
        "round" => PsOp::Round,
        "lt" => PsOp::Lt,
        "le" => PsOp::Le,
        "gt" => PsOp::Gt,
        "ge" => PsOp::Ge,
        "eq" => PsOp::Eq,
        "and" => PsOp::And,
        "or" => PsOp::Or,
        "not" => PsOp::Not,
        "roll" => PsOp::Roll,
        other => return Err(PdfError::corrupt(format!("unsupported postscript operator {other}"))),
    })
}

fn eval_sampled(
    domain: &[(f64, f64)],
    range: &[(f64, f64)],
    size: &[usize],
    bits_per_sample: u32,
    encode: &[(f64, f64)],
    decode: &[(f64, f64)],
    samples: &[u32],
    inputs: &[f64],
) -> Result<Vec<f64>> {
    let m = domain.len();
    let n = range.len();
    if inputs.len() < m {
        return Err(PdfError::corrupt("sampled function: too few inputs"));
    }

    // Encode each input into a sample-space coordinate, then round to the
    // nearest sample (no true multilinear interpolation across dimensions;
    // linear interpolation is applied only along the first axis, which
    // covers the overwhelmingly common 1-D tint-transform case).
    let mut coords = Vec::with_capacity(m);
    for i in 0..m {
        let x = clamp(inputs[i], domain[i]);
        let e = interpolate(x, domain[i].0, domain[i].1, encode[i].0, encode[i].1);
        let e = e.max(0.0).min((size[i].saturating_sub(1)) as f64);
        coords.push(e);
    }

    let max_val = (1u64 << bits_per_sample) - 1;
    let sample_at = |idx: Vec<usize>| -> Vec<f64> {
        let mut flat = 0usize;
        let mut stride = 1usize;
        for (dim, &c) in idx.iter().enumerate() {
            flat += c.min(size[dim].saturating_sub(1)) * stride;
            stride *= size[dim].max(1);
        }
        let base = flat * n;
        (0..n)
            .map(|j| {
                let raw = *samples.get(base + j).unwrap_or(&0) as f64;
                interpolate(raw, 0.0, max_val as f64, decode[j].0, decode[j].1)
            })
            .collect()
    };

    if m == 1 {
        let c0 = coords[0].floor() as usize;
        let c1 = (c0 + 1).min(size[0].saturating_sub(1));
        let frac = coords[0] - c0 as f64;
        let lo = sample_at(vec![c0]);
        let hi = sample_at(vec![c1]);
        Ok(lo
            .iter()
            .zip(hi.iter())
            .map(|(a, b)| clamp(a + frac * (b - a), range[0]))
            .collect())
    } else {
        let idx: Vec<usize> = coords.iter().map(|c| c.round() as usize).collect();
        let out = sample_at(idx);
        Ok(out
            .iter()
            .enumerate()
            .map(|(j, v)| clamp(*v, range[j]))
            .collect())
    }
}

fn eval_stitching(
    domain: (f64, f64),
    functions: &[PDFFunction],
    bounds: &[f64],
    encode: &[(f64, f64)],
    inputs: &[f64],
) -> Result<Vec<f64>> {
    let x = clamp(inputs.first().copied().unwrap_or(0.0), domain);
    let k = functions.len();
    if k == 0 {
        return Err(PdfError::corrupt("stitching function has no sub-functions"));
    }
    let mut idx = 0;
    while idx < bounds.len() && x >= bounds[idx] {
        idx += 1;
    }
    let idx = idx.min(k - 1);
    let lo = if idx == 0 { domain.0 } else { bounds[idx - 1] };
    let hi = if idx == bounds.len() { domain.1 } else { bounds[idx] };
    let (e_lo, e_hi) = encode.get(idx).copied().unwrap_or((0.0, 1.0));
    let x_enc = interpolate(x, lo, hi, e_lo, e_hi);
    functions[idx].eval(&[x_enc])
}

fn eval_postscript(
    domain: &[(f64, f64)],
    range: &[(f64, f64)],
    program: &[PsOp],
    inputs: &[f64],
) -> Result<Vec<f64>> {
    let mut stack: Vec<f64> = inputs
        .iter()
        .zip(domain.iter())
        .map(|(x, d)| clamp(*x, *d))
        .collect();
    run_ops(program, &mut stack)?;
    let n = range.len();
    if stack.len() < n {
        return Err(PdfError::corrupt("postscript function: stack underflow"));
    }
    let start = stack.len() - n;
    Ok(stack[start..]
        .iter()
        .zip(range.iter())
        .map(|(v, r)| clamp(*v, *r))
        .collect())
}

fn run_ops(ops: &[PsOp], stack: &mut Vec<f64>) -> Result<()> {
    macro_rules! pop2 {
        () => {{
            let b = stack.pop().ok_or_else(|| PdfError::corrupt("stack underflow"))?;
            let a = stack.pop().ok_or_else(|| PdfError::corrupt("stack underflow"))?;
            (a, b)
        }};
    }
    for op in ops {
        match op {
            PsOp::Push(v) => stack.push(*v),
            PsOp::Add => {
                let (a, b) = pop2!();
                stack.push(a + b);
            }
            PsOp::Sub => {
                let (a, b) = pop2!();
                stack.push(a - b);
            }
            PsOp::Mul => {
                let (a, b) = pop2!();
                stack.push(a * b);
            }
            PsOp::Div => {
                let (a, b) = pop2!();
                stack.push(if b != 0.0 { a / b } else { 0.0 });
            }
            PsOp::Neg => {
                let a = stack.pop().ok_or_else(|| PdfError::corrupt("stack underflow"))?;
                stack.push(-a);
            }
            PsOp::Abs => {
                let a = stack.pop().ok_or_else(|| PdfError::corrupt("stack underflow"))?;
                stack.push(a.abs());
            }
            PsOp::Sqrt => {
                let a = stack.pop().ok_or_else(|| PdfError::corrupt("stack underflow"))?;
                stack.push(a.max(0.0).sqrt());
            }
            PsOp::Dup => {
                let a = *stack.last().ok_or_else(|| PdfError::corrupt("stack underflow"))?;
                stack.push(a);
            }
            PsOp::Pop => {
                stack.pop();
            }
            PsOp::Exch => {
                let (a, b) = pop2!();
                stack.push(b);
                stack.push(a);
            }
            PsOp::Cvr | PsOp::Cvi => {}
            PsOp::Truncate => {
                let a = stack.pop().ok_or_else(|| PdfError::corrupt("stack underflow"))?;
                stack.push(a.trunc());
            }
            PsOp::Round => {
                let a = stack.pop().ok_or_else(|| PdfError::corrupt("stack underflow"))?;
                stack.push(a.round());
            }
            PsOp::Lt => {
                let (a, b) = pop2!();
                stack.push((a < b) as u8 as f64);
            }
            PsOp::Le => {
                let (a, b) = pop2!();
                stack.push((a <= b) as u8 as f64);
            }
            PsOp::Gt => {
                let (a, b) = pop2!();
                stack.push((a > b) as u8 as f64);
            }
            PsOp::Ge => {
                let (a, b) = pop2!();
                stack.push((a >= b) as u8 as f64);
            }
            PsOp::Eq => {
                let (a, b) = pop2!();
                stack.push((a == b) as u8 as f64);
            }
            PsOp::And => {
                let (a, b) = pop2!();
                stack.push(((a != 0.0) && (b != 0.0)) as u8 as f64);
            }
            PsOp::Or => {
                let (a, b) = pop2!();
                stack.push(((a != 0.0) || (b != 0.0)) as u8 as f64);
            }
            PsOp::Not => {
                let a = stack.pop().ok_or_else(|| PdfError::corrupt("stack underflow"))?;
                stack.push((a == 0.0) as u8 as f64);
            }
            PsOp::Index(n) => {
                let i = stack
                    .len()
                    .checked_sub(1 + *n as usize)
                    .ok_or_else(|| PdfError::corrupt("stack underflow"))?;
                stack.push(stack[i]);
            }
            PsOp::Roll => {
                let (n, j) = pop2!();
                let n = n as usize;
                if n > 0 && n <= stack.len() {
                    let j = ((j as i64).rem_euclid(n as i64)) as usize;
                    let start = stack.len() - n;
                    stack[start..].rotate_right(j);
                }
            }
            PsOp::If(body) => {
                let cond = stack.pop().ok_or_else(|| PdfError::corrupt("stack underflow"))?;
                if cond != 0.0 {
                    run_ops(body, stack)?;
                }
            }
            PsOp::IfElse(then_body, else_body) => {
                let cond = stack.pop().ok_or_else(|| PdfError::corrupt("stack underflow"))?;
                if cond != 0.0 {
                    run_ops(then_body, stack)?;
                } else {
                    run_ops(else_body, stack)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_identity() {
        let f = PDFFunction::Exponential {
            domain: (0.0, 1.0),
            c0: vec![0.0],
            c1: vec![1.0],
            n: 1.0,
        };
        assert_eq!(f.eval(&[0.25]).unwrap(), vec![0.25]);
    }

    #[test]
    fn stitching_picks_subfunction() {
        let lo = PDFFunction::Exponential {
            domain: (0.0, 1.0),
            c0: vec![0.0],
            c1: vec![0.5],
            n: 1.0,
        };
        let hi = PDFFunction::Exponential {
            domain: (0.0, 1.0),
            c0: vec![0.5],
            c1: vec![1.0],
            n: 1.0,
        };
        let f = PDFFunction::Stitching {
            domain: (0.0, 1.0),
            functions: vec![lo, hi],
            bounds: vec![0.5],
            encode: vec![(0.0, 1.0), (0.0, 1.0)],
        };
        assert!(f.eval(&[0.9]).unwrap()[0] > 0.5);
    }

    #[test]
    fn postscript_add_mul() {
        // { 2 mul 1 add }
        let prog = vec![PsOp::Push(2.0), PsOp::Mul, PsOp::Push(1.0), PsOp::Add];
        let f = PDFFunction::PostScript {
            domain: vec![(0.0, 1.0)],
            range: vec![(0.0, 10.0)],
            program: prog,
        };
        assert_eq!(f.eval(&[2.0]).unwrap(), vec![5.0]);
    }

    fn identity_resolve(obj: &PDFObject) -> Result<PDFObject> {
        Ok(obj.clone())
    }

    #[test]
    fn from_object_builds_exponential() {
        let mut dict = crate::model::objects::Dictionary::new();
        dict.insert("FunctionType".into(), PDFObject::Int(2));
        dict.insert("Domain".into(), PDFObject::Array(vec![PDFObject::Real(0.0), PDFObject::Real(1.0)]));
        dict.insert("C0".into(), PDFObject::Array(vec![PDFObject::Real(0.0)]));
        dict.insert("C1".into(), PDFObject::Array(vec![PDFObject::Real(1.0)]));
        dict.insert("N".into(), PDFObject::Real(1.0));

        let decode_stream = |_: &PDFStream| -> Result<Vec<u8>> { Ok(Vec::new()) };
        let f = PDFFunction::from_object(&PDFObject::Dict(dict), &identity_resolve, &decode_stream).unwrap();
        assert!(matches!(f, PDFFunction::Exponential { .. }));
        assert_eq!(f.eval(&[0.25]).unwrap(), vec![0.25]);
    }

    #[test]
    fn from_object_parses_postscript_program() {
        let mut attrs = crate::model::objects::Dictionary::new();
        attrs.insert("FunctionType".into(), PDFObject::Int(4));
        attrs.insert("Domain".into(), PDFObject::Array(vec![PDFObject::Real(0.0), PDFObject::Real(1.0)]));
        attrs.insert("Range".into(), PDFObject::Array(vec![PDFObject::Real(0.0), PDFObject::Real(10.0)]));
        let stream = PDFStream::new(attrs, b"{ 2 mul 1 add }".to_vec());

        let decode_stream = |s: &PDFStream| -> Result<Vec<u8>> { Ok(s.rawdata().to_vec()) };
        let f = PDFFunction::from_object(&PDFObject::Stream(Box::new(stream)), &identity_resolve, &decode_stream).unwrap();
        assert_eq!(f.eval(&[2.0]).unwrap(), vec![5.0]);
    }
}
