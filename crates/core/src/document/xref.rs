//! Cross-reference resolution (§5): table-form and stream-form xref
//! sections, `/Prev` chains, and the recovery scan used when `startxref`
//! is missing or corrupt.

use crate::error::{PdfError, Result};
use crate::model::Dictionary;
use crate::parser::lexer::{next_token, skip_whitespace, Token};
use crate::parser::object_parser::{LengthResolver, NoLengthResolver, ObjectParser};
use std::collections::HashMap;

/// Where to find one object: a byte offset in the file, or a slot inside
/// a compressed object stream.
#[derive(Debug, Clone, Copy)]
pub enum XRefLocation {
    Offset { offset: usize, genno: u16 },
    InStream { stream_objid: u32, index: usize },
    /// The object is marked free in this section. A later incremental
    /// update can free an object that an earlier section still lists as
    /// in use; this variant lets lookup stop there instead of resolving
    /// through to the stale entry.
    Free,
}

/// One cross-reference section: its entries and the trailer dictionary
/// attached to it (either a traditional `trailer` block, or an xref
/// stream's own attribute dictionary).
#[derive(Debug, Default)]
pub struct XRefSection {
    pub entries: HashMap<u32, XRefLocation>,
    pub trailer: Dictionary,
    pub is_recovery: bool,
}

impl XRefSection {
    pub fn get(&self, objid: u32) -> Option<XRefLocation> {
        self.entries.get(&objid).copied()
    }
}

/// The full chain of cross-reference sections for a document, most recent
/// (the one `startxref` points to) first. Lookups walk the chain in order
/// so the newest entry for an object id wins, matching incremental update
/// semantics.
#[derive(Debug, Default)]
pub struct CrossRefIndex {
    pub sections: Vec<XRefSection>,
}

pub const MAX_XREF_CHAIN: usize = 1024;

impl CrossRefIndex {
    pub fn lookup(&self, objid: u32) -> Option<XRefLocation> {
        self.sections.iter().find_map(|s| s.get(objid))
    }

    pub fn trailers(&self) -> impl Iterator<Item = &Dictionary> {
        self.sections.iter().map(|s| &s.trailer)
    }

    pub fn object_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.sections.iter().flat_map(|s| s.entries.keys().copied()).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Walk the `/Prev` (and hybrid `/XRefStm`) chain starting at `pos`,
    /// loading one section per link. A visited-offset set breaks cycles;
    /// a hard cap on chain length guards against pathological files.
    pub fn load_chain(data: &[u8], start_pos: usize) -> Result<Self> {
        let mut index = CrossRefIndex::default();
        let mut visited = std::collections::HashSet::new();
        let mut pos = start_pos;

        loop {
            if index.sections.len() >= MAX_XREF_CHAIN {
                return Err(PdfError::Limit("xref chain exceeds maximum length"));
            }
            if !visited.insert(pos) {
                break;
            }
            let section = load_section_at(data, pos)?;

            let xref_stm = section
                .trailer
                .get("XRefStm")
                .and_then(|p| p.as_int().ok())
                .map(|n| n as usize);
            let prev = section
                .trailer
                .get("Prev")
                .and_then(|p| p.as_int().ok())
                .map(|n| n as usize);

            index.sections.push(section);

            if let Some(stm_pos) = xref_stm {
                if visited.insert(stm_pos) {
                    if let Ok(stm_section) = load_xref_stream(data, stm_pos) {
                        index.sections.push(stm_section);
                    }
                }
            }

            match prev {
                Some(p) => pos = p,
                None => break,
            }
        }

        Ok(index)
    }

    /// Build a recovery index by scanning the whole file for `N G obj`
    /// markers, used when `startxref`/the xref chain is unusable.
    pub fn recover(data: &[u8]) -> Result<Self> {
        let re = regex::bytes::Regex::new(r"(\d+)\s+(\d+)\s+obj\b").unwrap();
        let mut section = XRefSection {
            is_recovery: true,
            ..Default::default()
        };

        for cap in re.captures_iter(data) {
            let objid: u32 = match std::str::from_utf8(&cap[1]).ok().and_then(|s| s.parse().ok()) {
                Some(v) => v,
                None => continue,
            };
            let genno: u16 = match std::str::from_utf8(&cap[2]).ok().and_then(|s| s.parse().ok()) {
                Some(v) => v,
                None => continue,
            };
            let offset = cap.get(0).unwrap().start();
            // First occurrence wins: ties on a duplicate (objid, genno) are
            // resolved deterministically in favor of the earlier marker.
            if !section.entries.contains_key(&objid) {
                section.entries.insert(objid, XRefLocation::Offset { offset, genno });
            }
        }

        if let Some(trailer_pos) = find_last(data, b"trailer") {
            let after = skip_whitespace(data, trailer_pos + b"trailer".len());
            if data[after..].starts_with(b"<<") {
                let resolver = NoLengthResolver;
                let parser = ObjectParser::new(data);
                if let Ok((obj, _)) = parser.parse_object_at(after, 0, &resolver) {
                    if let Ok(dict) = obj.as_dict() {
                        section.trailer = dict.clone();
                    }
                }
            }
        }

        if section.entries.is_empty() {
            return Err(PdfError::corrupt("recovery scan found no objects"));
        }

        Ok(CrossRefIndex {
            sections: vec![section],
        })
    }
}

fn find_last(data: &[u8], needle: &[u8]) -> Option<usize> {
    if data.len() < needle.len() {
        return None;
    }
    (0..=data.len() - needle.len()).rev().find(|&i| &data[i..i + needle.len()] == needle)
}

/// Locate `startxref` near the end of the file and return the offset it
/// names.
pub fn find_startxref(data: &[u8]) -> Result<usize> {
    let needle = b"startxref";
    if data.len() < needle.len() {
        return Err(PdfError::corrupt("file too small to contain startxref"));
    }
    let search_start = data.len().saturating_sub(2048);
    let hay = &data[search_start..];
    let found = (0..=hay.len().saturating_sub(needle.len()))
        .rev()
        .find(|&p| &hay[p..p + needle.len()] == needle)
        .map(|p| search_start + p);
    let Some(i) = found else {
        return Err(PdfError::corrupt("startxref keyword not found"));
    };
    let mut pos = skip_whitespace(data, i + needle.len());
    let start = pos;
    while pos < data.len() && data[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos == start {
        return Err(PdfError::corrupt("startxref missing offset"));
    }
    std::str::from_utf8(&data[start..pos])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| PdfError::corrupt("startxref offset is not a number"))
}

fn load_section_at(data: &[u8], pos: usize) -> Result<XRefSection> {
    if pos >= data.len() {
        return Err(PdfError::corrupt("xref offset exceeds file size"));
    }
    if data[pos..].starts_with(b"xref") {
        load_traditional_xref(data, pos)
    } else {
        load_xref_stream(data, pos)
    }
}

fn read_decimal(data: &[u8], mut pos: usize) -> Result<(i64, usize)> {
    let start = pos;
    while pos < data.len() && data[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos == start {
        return Err(PdfError::corrupt("expected a decimal number"));
    }
    let n: i64 = std::str::from_utf8(&data[start..pos])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| PdfError::corrupt("malformed xref number"))?;
    Ok((n, pos))
}

fn skip_eol_ws(data: &[u8], mut pos: usize) -> usize {
    while pos < data.len() && matches!(data[pos], b' ' | b'\n' | b'\r') {
        pos += 1;
    }
    pos
}

/// Traditional `xref` keyword table: one or more subsections of fixed
/// 20-byte entries, terminated by a `trailer` dictionary.
fn load_traditional_xref(data: &[u8], pos: usize) -> Result<XRefSection> {
    let mut section = XRefSection::default();
    let mut cursor = pos + 4; // skip "xref"
    cursor = skip_eol_ws(data, cursor);

    loop {
        cursor = skip_eol_ws(data, cursor);
        if cursor >= data.len() {
            break;
        }
        if data[cursor..].starts_with(b"trailer") {
            cursor += 7;
            break;
        }

        let (start_objid, c1) = read_decimal(data, cursor)?;
        cursor = skip_eol_ws(data, c1);
        let (count, c2) = read_decimal(data, cursor)?;
        cursor = c2;
        while cursor < data.len() && !matches!(data[cursor], b'\n' | b'\r') {
            cursor += 1;
        }
        cursor = skip_eol_ws(data, cursor);

        let mut base_objid = start_objid as u32;
        for i in 0..count {
            let (offset, c3) = read_decimal(data, cursor)?;
            cursor = c3;
            while cursor < data.len() && data[cursor] == b' ' {
                cursor += 1;
            }
            let (genno, c4) = read_decimal(data, cursor)?;
            cursor = c4;
            while cursor < data.len() && data[cursor] == b' ' {
                cursor += 1;
            }
            let marker = if cursor < data.len() { data[cursor] } else { b'f' };
            cursor += 1;

            // Some writers start a subsection at 1 but still emit the
            // conventional "0000000000 65535 f" free head entry; realign
            // so that entry lands on object 0.
            if i == 0 && base_objid > 0 && marker == b'f' && offset == 0 && genno == 65535 {
                base_objid -= 1;
            }
            let objid = base_objid + i as u32;

            while cursor < data.len() && !matches!(data[cursor], b'\n' | b'\r') {
                cursor += 1;
            }
            cursor = skip_eol_ws(data, cursor);

            if marker == b'n' {
                section.entries.insert(
                    objid,
                    XRefLocation::Offset {
                        offset: offset as usize,
                        genno: genno as u16,
                    },
                );
            } else if marker == b'f' {
                section.entries.insert(objid, XRefLocation::Free);
            }
        }
    }

    let trailer_start = skip_eol_ws(data, cursor);
    if data[trailer_start..].starts_with(b"<<") {
        let resolver = NoLengthResolver;
        let parser = ObjectParser::new(data);
        if let Ok((obj, _)) = parser.parse_object_at(trailer_start, 0, &resolver) {
            if let Ok(dict) = obj.as_dict() {
                section.trailer = dict.clone();
            }
        }
    }

    Ok(section)
}

fn read_be_int(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

/// Cross-reference stream (PDF 1.5+): the table is itself a stream object
/// whose rows are packed big-endian fields of widths given by `/W`.
///
/// Decoding an xref stream needs a `LengthResolver` to resolve an
/// indirect `/Length`, but that resolver is normally built FROM the xref
/// index — so the very first xref section in a document is always parsed
/// with `NoLengthResolver` and, if `/Length` turns out to be indirect,
/// falls back to `endstream`-keyword backtracking.
fn load_xref_stream(data: &[u8], pos: usize) -> Result<XRefSection> {
    let resolver = NoLengthResolver;
    let parser = ObjectParser::new(data);
    let (obj, _) = parser.parse_object_at(pos, 0, &resolver)?;
    let stream = obj.as_stream()?;

    let w = stream
        .get("W")
        .ok_or_else(|| PdfError::corrupt("xref stream missing /W"))?
        .as_array()?;
    if w.len() != 3 {
        return Err(PdfError::corrupt("/W must have exactly 3 entries"));
    }
    let w0 = w[0].as_int()? as usize;
    let w1 = w[1].as_int()? as usize;
    let w2 = w[2].as_int()? as usize;
    let entry_size = w0 + w1 + w2;

    let size = stream
        .get("Size")
        .ok_or_else(|| PdfError::corrupt("xref stream missing /Size"))?
        .as_int()? as usize;

    let index_pairs: Vec<(u32, usize)> = match stream.get("Index") {
        Some(idx) => {
            let arr = idx.as_array()?;
            arr.chunks(2)
                .filter(|pair| pair.len() == 2)
                .filter_map(|pair| Some((pair[0].as_int().ok()? as u32, pair[1].as_int().ok()? as usize)))
                .collect()
        }
        None => vec![(0, size)],
    };

    let filter_name = stream.get("Filter").and_then(|f| f.as_name().ok()).map(str::to_string);
    let parms = stream.get("DecodeParms").and_then(|p| p.as_dict().ok()).cloned();
    let body = match filter_name {
        Some(name) => crate::codec::apply_filter(&name, stream.rawdata(), parms.as_ref())?,
        None => stream.rawdata().to_vec(),
    };

    let mut section = XRefSection::default();
    let mut data_pos = 0;
    for (start_objid, count) in index_pairs {
        for i in 0..count {
            if data_pos + entry_size > body.len() {
                break;
            }
            let objid = start_objid + i as u32;
            let obj_type = if w0 > 0 { read_be_int(&body[data_pos..data_pos + w0]) } else { 1 };
            let field1 = read_be_int(&body[data_pos + w0..data_pos + w0 + w1]);
            let field2 = read_be_int(&body[data_pos + w0 + w1..data_pos + entry_size]);
            data_pos += entry_size;

            match obj_type {
                0 => {
                    section.entries.insert(objid, XRefLocation::Free);
                }
                1 => {
                    section.entries.insert(
                        objid,
                        XRefLocation::Offset {
                            offset: field1 as usize,
                            genno: field2 as u16,
                        },
                    );
                }
                2 => {
                    section.entries.insert(
                        objid,
                        XRefLocation::InStream {
                            stream_objid: field1 as u32,
                            index: field2 as usize,
                        },
                    );
                }
                _ => {}
            }
        }
    }

    for (key, value) in &stream.attrs {
        if !matches!(key.as_str(), "Length" | "Filter" | "DecodeParms" | "W" | "Index") {
            section.trailer.insert(key.clone(), value.clone());
        }
    }

    Ok(section)
}

/// Tolerate a stray `Token::Eof` the same way the rest of the tokenizer
/// does; kept as a standalone helper so callers don't need to import
/// `Token` just to peek past whitespace.
pub fn peek_keyword(data: &[u8], pos: usize) -> Option<(Vec<u8>, usize)> {
    let pos = skip_whitespace(data, pos);
    match next_token(data, pos) {
        Ok((Token::Keyword(kw), after)) => Some((kw, after)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_table_pdf() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n");
        let obj1_off = buf.len();
        buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
        let obj2_off = buf.len();
        buf.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n");
        let xref_off = buf.len();
        buf.extend_from_slice(b"xref\n0 3\n");
        buf.extend_from_slice(b"0000000000 65535 f \n");
        buf.extend_from_slice(format!("{:010} 00000 n \n", obj1_off).as_bytes());
        buf.extend_from_slice(format!("{:010} 00000 n \n", obj2_off).as_bytes());
        buf.extend_from_slice(b"trailer\n<< /Size 3 /Root 1 0 R >>\n");
        buf.extend_from_slice(format!("startxref\n{}\n%%EOF", xref_off).as_bytes());
        buf
    }

    #[test]
    fn table_form_round_trip() {
        let data = minimal_table_pdf();
        let start = find_startxref(&data).unwrap();
        let index = CrossRefIndex::load_chain(&data, start).unwrap();
        assert!(matches!(index.lookup(1), Some(XRefLocation::Offset { .. })));
        assert!(matches!(index.lookup(2), Some(XRefLocation::Offset { .. })));
        assert!(index.lookup(3).is_none());
    }

    #[test]
    fn newer_free_entry_shadows_older_offset() {
        // An object in use in an older xref section (an earlier incremental
        // save) but freed by a later one must resolve as free, not fall
        // through to the stale offset.
        let mut newer = XRefSection::default();
        newer.entries.insert(5, XRefLocation::Free);
        let mut older = XRefSection::default();
        older.entries.insert(5, XRefLocation::Offset { offset: 123, genno: 0 });
        let index = CrossRefIndex {
            sections: vec![newer, older],
        };
        assert!(matches!(index.lookup(5), Some(XRefLocation::Free)));
    }

    #[test]
    fn recovery_scan_finds_objects_without_xref() {
        let mut data = minimal_table_pdf();
        // Corrupt startxref so the normal path fails and recovery kicks in.
        let pos = data.windows(9).position(|w| w == b"startxref").unwrap();
        data[pos] = b'X';
        let index = CrossRefIndex::recover(&data).unwrap();
        assert!(index.lookup(1).is_some());
        assert!(index.lookup(2).is_some());
    }
}
