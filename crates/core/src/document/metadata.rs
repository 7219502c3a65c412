//! Structural document views: `/Info` metadata, annotations, form fields,
//! and the `NumberTree`/`NameTree`/`PageLabelStyle` helpers that back
//! `/PageLabels` and the `/Names` dictionary (§3 "Supplementary data
//! types", grounded in pdfminer.six's `data_structures.py`/page-label
//! formatting, which the teacher ports as `data_structures.rs`).

use std::collections::HashMap;

use crate::document::document::Document;
use crate::error::Result;
use crate::model::{Dictionary, PDFObject, Rect};

/// A generic number-tree walker (`/Nums` leaves, `/Kids` + `/Limits`
/// branches) — used for `/PageLabels` and any CID-keyed structure that
/// shares the same shape.
pub struct NumberTree<'a> {
    doc: &'a Document,
    root: PDFObject,
}

impl<'a> NumberTree<'a> {
    pub fn new(doc: &'a Document, root: PDFObject) -> Self {
        Self { doc, root }
    }

    pub fn lookup(&self, key: i64) -> Option<PDFObject> {
        self.lookup_in(&self.root, key)
    }

    fn lookup_in(&self, node: &PDFObject, key: i64) -> Option<PDFObject> {
        let resolved = self.doc.resolve(node).ok()?;
        let dict = resolved.as_dict().ok()?;
        if let Some(nums) = dict.get("Nums").and_then(|n| self.doc.resolve(n).ok()) {
            if let Ok(arr) = nums.as_array() {
                let mut i = 0;
                while i + 1 < arr.len() {
                    if arr[i].as_int().ok() == Some(key) {
                        return self.doc.resolve(&arr[i + 1]).ok();
                    }
                    i += 2;
                }
            }
        }
        if let Some(kids) = dict.get("Kids").and_then(|k| self.doc.resolve(k).ok()) {
            if let Ok(arr) = kids.as_array() {
                for kid in arr {
                    if within_limits(self.doc, kid, key) {
                        if let Some(found) = self.lookup_in(kid, key) {
                            return Some(found);
                        }
                    }
                }
            }
        }
        None
    }

    /// All `(key, value)` pairs in ascending key order, flattening `/Kids`.
    pub fn entries(&self) -> Vec<(i64, PDFObject)> {
        let mut out = Vec::new();
        self.collect(&self.root, &mut out);
        out.sort_by_key(|(k, _)| *k);
        out
    }

    fn collect(&self, node: &PDFObject, out: &mut Vec<(i64, PDFObject)>) {
        let Some(resolved) = self.doc.resolve(node).ok() else { return };
        let Ok(dict) = resolved.as_dict() else { return };
        if let Some(nums) = dict.get("Nums").and_then(|n| self.doc.resolve(n).ok()) {
            if let Ok(arr) = nums.as_array() {
                let mut i = 0;
                while i + 1 < arr.len() {
                    if let Ok(key) = arr[i].as_int() {
                        if let Some(v) = self.doc.resolve(&arr[i + 1]).ok() {
                            out.push((key, v));
                        }
                    }
                    i += 2;
                }
            }
        }
        if let Some(kids) = dict.get("Kids").and_then(|k| self.doc.resolve(k).ok()) {
            if let Ok(arr) = kids.as_array() {
                for kid in arr {
                    self.collect(kid, out);
                }
            }
        }
    }
}

fn within_limits(doc: &Document, node: &PDFObject, key: i64) -> bool {
    let Some(resolved) = doc.resolve(node).ok() else { return true };
    let Ok(dict) = resolved.as_dict() else { return true };
    let Some(limits) = dict.get("Limits").and_then(|l| l.as_array().ok()) else { return true };
    if limits.len() != 2 {
        return true;
    }
    let lo = limits[0].as_int().unwrap_or(i64::MIN);
    let hi = limits[1].as_int().unwrap_or(i64::MAX);
    (lo..=hi).contains(&key)
}

/// A generic name-tree walker (`/Names` leaves, `/Kids` + `/Limits`
/// branches) — used for the document's `/Names` dictionary (`/Dests`,
/// `/AcroForm` field name resolution).
pub struct NameTree<'a> {
    doc: &'a Document,
    root: PDFObject,
}

impl<'a> NameTree<'a> {
    pub fn new(doc: &'a Document, root: PDFObject) -> Self {
        Self { doc, root }
    }

    pub fn lookup(&self, name: &[u8]) -> Option<PDFObject> {
        self.lookup_in(&self.root, name)
    }

    fn lookup_in(&self, node: &PDFObject, name: &[u8]) -> Option<PDFObject> {
        let resolved = self.doc.resolve(node).ok()?;
        let dict = resolved.as_dict().ok()?;
        if let Some(names) = dict.get("Names").and_then(|n| self.doc.resolve(n).ok()) {
            if let Ok(arr) = names.as_array() {
                let mut i = 0;
                while i + 1 < arr.len() {
                    if arr[i].as_string().ok() == Some(name) {
                        return self.doc.resolve(&arr[i + 1]).ok();
                    }
                    i += 2;
                }
            }
        }
        if let Some(kids) = dict.get("Kids").and_then(|k| self.doc.resolve(k).ok()) {
            if let Ok(arr) = kids.as_array() {
                for kid in arr {
                    if let Some(found) = self.lookup_in(kid, name) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }
}

/// Page-numbering style named by a `/PageLabels` dict's `/S` entry
/// (ISO 32000-2 §12.4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLabelStyle {
    Decimal,
    UpperRoman,
    LowerRoman,
    UpperAlpha,
    LowerAlpha,
}

impl PageLabelStyle {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "D" => Some(Self::Decimal),
            "R" => Some(Self::UpperRoman),
            "r" => Some(Self::LowerRoman),
            "A" => Some(Self::UpperAlpha),
            "a" => Some(Self::LowerAlpha),
            _ => None,
        }
    }

    /// Formats `value` (a 1-based ordinal within the label range) per
    /// the named numbering style.
    pub fn format(self, value: i64) -> String {
        match self {
            Self::Decimal => value.to_string(),
            Self::UpperRoman => to_roman(value),
            Self::LowerRoman => to_roman(value).to_lowercase(),
            Self::UpperAlpha => to_alpha(value),
            Self::LowerAlpha => to_alpha(value).to_lowercase(),
        }
    }
}

fn to_roman(mut n: i64) -> String {
    if n <= 0 {
        return String::new();
    }
    const VALUES: [(i64, &str); 13] = [
        (1000, "M"), (900, "CM"), (500, "D"), (400, "CD"),
        (100, "C"), (90, "XC"), (50, "L"), (40, "XL"),
        (10, "X"), (9, "IX"), (5, "V"), (4, "IV"), (1, "I"),
    ];
    let mut out = String::new();
    for (value, symbol) in VALUES {
        while n >= value {
            out.push_str(symbol);
            n -= value;
        }
    }
    out
}

/// `1 -> A, 2 -> B, ..., 26 -> Z, 27 -> AA, ...` per §12.4.2's alphabetic
/// numbering, which repeats the single letter `n` times for n in `1..=26`,
/// wraps to `n - 26` for `27..=52`, and so on (not positional base-26).
fn to_alpha(n: i64) -> String {
    if n <= 0 {
        return String::new();
    }
    let letter = (b'A' + ((n - 1) % 26) as u8) as char;
    let reps = (n - 1) / 26 + 1;
    std::iter::repeat(letter).take(reps as usize).collect()
}

/// A single annotation's structural fields — no drawing, per §1's
/// explicit non-goal.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub subtype: String,
    pub rect: Rect,
    pub contents: Option<String>,
    pub dict: Dictionary,
}

pub(crate) fn annotations_for(doc: &Document, attrs: &Dictionary) -> Result<Vec<Annotation>> {
    let mut out = Vec::new();
    let Some(annots_obj) = attrs.get("Annots") else { return Ok(out) };
    let Ok(resolved) = doc.resolve(annots_obj) else { return Ok(out) };
    let Ok(arr) = resolved.as_array() else { return Ok(out) };
    for entry in arr {
        let Ok(resolved) = doc.resolve(entry) else { continue };
        let Ok(dict) = resolved.as_dict() else { continue };
        let subtype = dict.get("Subtype").and_then(|s| s.as_name().ok()).unwrap_or("").to_string();
        let rect = dict
            .get("Rect")
            .and_then(|r| doc.resolve(r).ok())
            .and_then(|r| r.as_array().ok().cloned())
            .filter(|a| a.len() == 4)
            .and_then(|a| {
                Some((a[0].as_num().ok()?, a[1].as_num().ok()?, a[2].as_num().ok()?, a[3].as_num().ok()?))
            })
            .unwrap_or((0.0, 0.0, 0.0, 0.0));
        let contents = dict.get("Contents").and_then(|c| c.as_string().ok()).map(decode_text_string);
        out.push(Annotation { subtype, rect, contents, dict: dict.clone() });
    }
    Ok(out)
}

/// A single AcroForm field's structural fields — no interactive editing,
/// per §1's explicit non-goal.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub field_type: String,
    pub value: Option<String>,
    pub dict: Dictionary,
}

/// The document's full interactive form: every field reachable from
/// `/AcroForm /Fields`, flattening the field hierarchy via `/Kids`.
#[derive(Debug, Clone, Default)]
pub struct InteractiveForm {
    pub fields: Vec<FormField>,
}

pub(crate) fn form_fields_for(doc: &Document) -> Result<InteractiveForm> {
    let mut fields = Vec::new();
    if let Some(acro) = doc.catalog_entry("AcroForm") {
        if let Ok(resolved) = doc.resolve(acro) {
            if let Ok(dict) = resolved.as_dict() {
                if let Some(arr) = dict.get("Fields").and_then(|f| doc.resolve(f).ok()) {
                    if let Ok(arr) = arr.as_array() {
                        for field_ref in arr {
                            collect_field(doc, field_ref, String::new(), &mut fields);
                        }
                    }
                }
            }
        }
    }
    Ok(InteractiveForm { fields })
}

fn collect_field(doc: &Document, field_ref: &PDFObject, parent_name: String, out: &mut Vec<FormField>) {
    let Ok(resolved) = doc.resolve(field_ref) else { return };
    let Ok(dict) = resolved.as_dict() else { return };
    let partial_name = dict
        .get("T")
        .and_then(|t| t.as_string().ok())
        .map(decode_text_string)
        .unwrap_or_default();
    let name = if parent_name.is_empty() {
        partial_name
    } else if partial_name.is_empty() {
        parent_name.clone()
    } else {
        format!("{parent_name}.{partial_name}")
    };
    let field_type = dict.get("FT").and_then(|f| f.as_name().ok()).unwrap_or("").to_string();
    let value = dict.get("V").and_then(|v| v.as_string().ok()).map(decode_text_string);
    if !field_type.is_empty() || dict.contains_key("V") {
        out.push(FormField { name: name.clone(), field_type, value, dict: dict.clone() });
    }
    if let Some(kids) = dict.get("Kids").and_then(|k| doc.resolve(k).ok()) {
        if let Ok(arr) = kids.as_array() {
            for kid in arr {
                collect_field(doc, kid, name.clone(), out);
            }
        }
    }
}

/// Decodes a PDF text string: UTF-16BE with a `FE FF` BOM, or
/// PDFDocEncoding (treated as Latin-1, its ASCII-compatible common subset)
/// otherwise.
fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

pub(crate) fn metadata_for(doc: &Document) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let Some(info_obj) = doc.trailer_entry("Info") else { return out };
    let Ok(resolved) = doc.resolve(info_obj) else { return out };
    let Ok(dict) = resolved.as_dict() else { return out };
    for key in ["Title", "Author", "Subject", "Keywords", "Creator", "Producer", "CreationDate", "ModDate"] {
        if let Some(value) = dict.get(key).and_then(|v| v.as_string().ok()) {
            out.insert(key.to_string(), decode_text_string(value));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roman_numerals_match_known_values() {
        assert_eq!(to_roman(1994), "MCMXCIV");
        assert_eq!(to_roman(9), "IX");
    }

    #[test]
    fn alpha_labels_wrap_past_z() {
        assert_eq!(to_alpha(1), "A");
        assert_eq!(to_alpha(26), "Z");
        assert_eq!(to_alpha(27), "AA");
        assert_eq!(to_alpha(52), "ZZ");
    }

    #[test]
    fn utf16_text_string_decodes() {
        let bytes = [0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42];
        assert_eq!(decode_text_string(&bytes), "AB");
    }
}
