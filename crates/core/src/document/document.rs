//! Document (§4.4, §4.5): owns the byte source, the cross-reference index,
//! the trailer/catalog, the optional security handler, and the insert-only
//! object cache that breaks resolution cycles.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use bytes::Bytes;

use crate::api::DocumentOptions;
use crate::codec;
use crate::document::bytesource::{read_path_to_bytes, MmapSource};
use crate::document::metadata::{self, Annotation, InteractiveForm};
use crate::document::page::{Page, PageIndex};
use crate::document::security::{create_security_handler, PDFSecurityHandler};
use crate::document::xref::{self, CrossRefIndex, XRefLocation};
use crate::error::{PdfError, Result};
use crate::interp::ObjectResolver;
use crate::model::{Dictionary, PDFObjRef, PDFObject, PDFStream};
use crate::parser::object_parser::{LengthResolver, NoLengthResolver, ObjectParser};

thread_local! {
    /// Guards against a reference chain that resolves back into itself
    /// mid-parse (not the same thing as the object cache, which only
    /// breaks the cycle *after* the first resolution completes).
    static RESOLVING: RefCell<HashSet<u32>> = RefCell::new(HashSet::new());
}

struct ResolveGuard(u32);

impl Drop for ResolveGuard {
    fn drop(&mut self) {
        RESOLVING.with(|r| {
            r.borrow_mut().remove(&self.0);
        });
    }
}

/// A loaded PDF document. Construct with [`Document::load_from_bytes`] or
/// [`Document::load_from_path`]; everything else is read-only from here.
pub struct Document {
    data: Bytes,
    xrefs: CrossRefIndex,
    trailer: Dictionary,
    catalog: Dictionary,
    security_handler: Option<Box<dyn PDFSecurityHandler + Send + Sync>>,
    cache: Mutex<HashMap<u32, Arc<PDFObject>>>,
    page_index: OnceLock<PageIndex>,
    options: DocumentOptions,
}

impl Document {
    pub fn load_from_bytes(bytes: Bytes, options: DocumentOptions) -> Result<Self> {
        Self::load(bytes, options)
    }

    pub fn load_from_path(path: impl AsRef<Path>, options: DocumentOptions) -> Result<Self> {
        match MmapSource::open(path.as_ref()) {
            Ok(source) => Self::load(source.into_bytes(), options),
            Err(_) => Self::load(read_path_to_bytes(path)?, options),
        }
    }

    fn load(data: Bytes, options: DocumentOptions) -> Result<Self> {
        let xrefs = Self::load_xrefs(&data, &options)?;
        let trailer = Self::merge_trailer(&xrefs);

        let mut doc = Document {
            data,
            xrefs,
            trailer: trailer.clone(),
            catalog: Dictionary::new(),
            security_handler: None,
            cache: Mutex::new(HashMap::new()),
            page_index: OnceLock::new(),
            options,
        };

        if let Some(encrypt_entry) = trailer.get("Encrypt") {
            // Resolved before `security_handler` exists, so the strings
            // inside /Encrypt itself (O, U, ...) come back un-decrypted.
            let encrypt_obj = doc.resolve(encrypt_entry)?;
            let encrypt_dict = encrypt_obj
                .as_dict()
                .map_err(|_| PdfError::corrupt("/Encrypt is not a dictionary"))?
                .clone();
            let doc_id = Self::doc_id_from_trailer(&trailer);
            doc.security_handler =
                create_security_handler(&encrypt_dict, &doc_id, doc.options.password())?;
        }

        let root = trailer
            .get("Root")
            .ok_or_else(|| PdfError::corrupt("trailer has no /Root entry"))?;
        let catalog_obj = doc.resolve(root)?;
        doc.catalog = catalog_obj
            .as_dict()
            .map_err(|_| PdfError::corrupt("/Root is not a dictionary"))?
            .clone();

        Ok(doc)
    }

    fn load_xrefs(data: &[u8], options: &DocumentOptions) -> Result<CrossRefIndex> {
        let chain_result =
            xref::find_startxref(data).and_then(|pos| CrossRefIndex::load_chain(data, pos));
        let needs_recovery = match &chain_result {
            Ok(idx) => !idx.trailers().any(|t| t.contains_key("Root")),
            Err(_) => true,
        };
        if needs_recovery {
            if options.recovery_scan() {
                tracing::warn!("cross-reference table missing or unusable, running recovery scan");
                return CrossRefIndex::recover(data);
            }
            return chain_result;
        }
        chain_result
    }

    /// Most-recent-section-wins merge of every trailer in the chain.
    fn merge_trailer(xrefs: &CrossRefIndex) -> Dictionary {
        let mut merged = Dictionary::new();
        for trailer in xrefs.trailers() {
            for (key, value) in trailer {
                merged.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        merged
    }

    fn doc_id_from_trailer(trailer: &Dictionary) -> Vec<Vec<u8>> {
        match trailer.get("ID") {
            Some(PDFObject::Array(arr)) => {
                arr.iter().filter_map(|o| o.as_string().ok().map(|b| b.to_vec())).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.security_handler.is_some()
    }

    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    pub(crate) fn catalog_entry(&self, key: &str) -> Option<&PDFObject> {
        self.catalog.get(key)
    }

    pub(crate) fn trailer_entry(&self, key: &str) -> Option<&PDFObject> {
        self.trailer.get(key)
    }

    pub(crate) fn all_object_ids(&self) -> Vec<u32> {
        self.xrefs.object_ids()
    }

    /// Every object id known to the cross-reference index, for callers
    /// (the `dumppdf` CLI) that want to enumerate the whole file rather
    /// than walk the page tree.
    pub fn object_ids(&self) -> Vec<u32> {
        self.xrefs.object_ids()
    }

    /// Resolve object `objid` directly, bypassing the page/catalog API.
    pub fn getobj(&self, objid: u32) -> Result<Arc<PDFObject>> {
        self.getobj_shared(objid)
    }

    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    pub(crate) fn page_index(&self) -> &PageIndex {
        self.page_index.get_or_init(|| PageIndex::build(self))
    }

    pub fn page_count(&self) -> u32 {
        self.page_index().len() as u32
    }

    pub fn page(&self, index: u32) -> Result<Page<'_>> {
        Page::by_index(self, index as usize)
    }

    pub fn metadata(&self) -> HashMap<String, String> {
        metadata::metadata_for(self)
    }

    pub fn annotations(&self, page_index: u32) -> Result<Vec<Annotation>> {
        let page = self.page(page_index)?;
        metadata::annotations_for(self, page.raw_attrs())
    }

    pub fn form_fields(&self) -> Result<InteractiveForm> {
        metadata::form_fields_for(self)
    }

    /// Resolves `obj` if it is a reference, following chains and tolerating
    /// cycles (§4.4: "cyclic dictionaries are tolerated, the cache breaks
    /// the cycle"). Non-references are cloned back unchanged.
    pub fn resolve(&self, obj: &PDFObject) -> Result<PDFObject> {
        Ok((*self.resolve_shared(obj)?).clone())
    }

    pub fn resolve_shared(&self, obj: &PDFObject) -> Result<Arc<PDFObject>> {
        let PDFObject::Ref(r) = obj else {
            return Ok(Arc::new(obj.clone()));
        };
        let mut seen = HashSet::new();
        seen.insert(r.objid);
        let mut current = self.getobj_shared(r.objid)?;
        loop {
            match current.as_ref() {
                PDFObject::Ref(next) => {
                    if !seen.insert(next.objid) {
                        return Ok(Arc::new(PDFObject::Null));
                    }
                    current = self.getobj_shared(next.objid)?;
                }
                _ => return Ok(current),
            }
        }
    }

    pub(crate) fn getobj_shared(&self, objid: u32) -> Result<Arc<PDFObject>> {
        if let Some(hit) = self.cache.lock().unwrap().get(&objid).cloned() {
            return Ok(hit);
        }
        let already_resolving = RESOLVING.with(|r| !r.borrow_mut().insert(objid));
        if already_resolving {
            return Ok(Arc::new(PDFObject::Null));
        }
        let _guard = ResolveGuard(objid);

        let (raw, genno) = self.resolve_from_xref(objid)?;
        let obj = self.decrypt_object(raw, objid, genno);
        let arc = Arc::new(obj);

        let mut cache = self.cache.lock().unwrap();
        Ok(cache.entry(objid).or_insert(arc).clone())
    }

    fn resolve_from_xref(&self, objid: u32) -> Result<(PDFObject, u16)> {
        match self.xrefs.lookup(objid) {
            Some(XRefLocation::Offset { offset, genno }) => {
                let resolver = DocLengthResolver { doc: self };
                let parser = ObjectParser::with_max_depth(&self.data, self.options.max_nesting_depth());
                let (_objid, genno_on_disk, obj, _end) = parser.parse_indirect_object(offset, &resolver)?;
                Ok((obj, genno_on_disk.max(genno)))
            }
            Some(XRefLocation::InStream { stream_objid, index }) => {
                Ok((self.parse_object_from_stream(stream_objid, index)?, 0))
            }
            Some(XRefLocation::Free) | None => Ok((PDFObject::Null, 0)),
        }
    }

    fn parse_object_from_stream(&self, stream_objid: u32, index: usize) -> Result<PDFObject> {
        let stream_obj = self.getobj_shared(stream_objid)?;
        let stream = stream_obj
            .as_stream()
            .map_err(|_| PdfError::corrupt_obj(stream_objid, "object stream is not a stream"))?;
        let decoded = self.decode_stream(stream)?;

        let n = stream.get("N").and_then(|v| v.as_int().ok()).unwrap_or(0).max(0) as usize;
        let n = n.min(self.options.max_objstm_members() as usize);
        let first = stream.get("First").and_then(|v| v.as_int().ok()).unwrap_or(0).max(0) as usize;
        if index >= n {
            return Ok(PDFObject::Null);
        }

        let header_parser = ObjectParser::new(&decoded);
        let mut pos = 0usize;
        let mut target_offset = None;
        for i in 0..n {
            let (_objid_obj, p2) = header_parser.parse_object_at(pos, 0, &NoLengthResolver)?;
            let (offset_obj, p3) = header_parser.parse_object_at(p2, 0, &NoLengthResolver)?;
            pos = p3;
            if i == index {
                target_offset = offset_obj.as_int().ok();
            }
        }
        let Some(rel_offset) = target_offset else {
            return Ok(PDFObject::Null);
        };
        if rel_offset < 0 {
            return Ok(PDFObject::Null);
        }

        let obj_parser = ObjectParser::with_max_depth(&decoded, self.options.max_nesting_depth());
        let (obj, _end) = obj_parser.parse_object_at(first + rel_offset as usize, 0, &NoLengthResolver)?;
        Ok(obj)
    }

    /// Recursively decrypts strings and stream bodies belonging to object
    /// `(objid, genno)`. A no-op when the document isn't encrypted.
    fn decrypt_object(&self, obj: PDFObject, objid: u32, genno: u16) -> PDFObject {
        let Some(handler) = &self.security_handler else {
            return obj;
        };
        match obj {
            PDFObject::String { bytes, is_hex } => {
                let decrypted = handler.decrypt_string(objid, genno, &bytes);
                PDFObject::String { bytes: decrypted, is_hex }
            }
            PDFObject::Array(arr) => {
                PDFObject::Array(arr.into_iter().map(|o| self.decrypt_object(o, objid, genno)).collect())
            }
            PDFObject::Dict(dict) => PDFObject::Dict(
                dict.into_iter().map(|(k, v)| (k, self.decrypt_object(v, objid, genno))).collect(),
            ),
            PDFObject::Stream(mut stream) => {
                let decrypted_attrs: Dictionary = std::mem::take(&mut stream.attrs)
                    .into_iter()
                    .map(|(k, v)| (k, self.decrypt_object(v, objid, genno)))
                    .collect();
                stream.attrs = decrypted_attrs;
                let raw = stream.rawdata_bytes();
                let decrypted = handler.decrypt_stream(objid, genno, &raw, &stream.attrs);
                stream.set_rawdata_decrypted(decrypted);
                PDFObject::Stream(stream)
            }
            other => other,
        }
    }

    /// Applies a stream's filter chain, yielding decoded bytes. Decryption
    /// (if any) has already happened by the time a stream reaches the
    /// cache, via [`Document::decrypt_object`].
    pub fn decode_stream(&self, stream: &PDFStream) -> Result<Vec<u8>> {
        if let Some(cached) = stream.cached_decoded() {
            return Ok(cached.to_vec());
        }
        let mut data = stream.rawdata().to_vec();
        for (name, parms) in codec::filter_chain(&stream.attrs) {
            data = codec::apply_filter(&name, &data, parms.as_ref())?;
            if let Some(cap) = self.options.filter_output_cap() {
                if data.len() > cap {
                    data.truncate(cap);
                }
            }
        }
        Ok(data)
    }
}

impl ObjectResolver for Document {
    fn resolve(&self, obj: &PDFObject) -> Result<PDFObject> {
        Document::resolve(self, obj)
    }

    fn decode_stream(&self, stream: &PDFStream) -> Result<Vec<u8>> {
        Document::decode_stream(self, stream)
    }
}

struct DocLengthResolver<'a> {
    doc: &'a Document,
}

impl<'a> LengthResolver for DocLengthResolver<'a> {
    fn resolve_length(&self, r: PDFObjRef) -> Option<i64> {
        self.doc.getobj_shared(r.objid).ok().and_then(|o| o.as_int().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_pdf() -> Vec<u8> {
        let mut pdf = Vec::new();
        pdf.extend_from_slice(b"%PDF-1.4\n");
        let mut offsets = Vec::new();

        offsets.push(pdf.len());
        pdf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        offsets.push(pdf.len());
        pdf.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");

        offsets.push(pdf.len());
        pdf.extend_from_slice(
            b"3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << >> >>\nendobj\n",
        );

        offsets.push(pdf.len());
        let content = b"1 0 0 1 0 0 cm\n0 0 100 100 re f\n";
        pdf.extend_from_slice(
            format!("4 0 obj\n<< /Length {} >>\nstream\n", content.len()).as_bytes(),
        );
        pdf.extend_from_slice(content);
        pdf.extend_from_slice(b"\nendstream\nendobj\n");

        let xref_pos = pdf.len();
        pdf.extend_from_slice(b"xref\n0 5\n0000000000 65535 f \n");
        for off in &offsets {
            pdf.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
        }
        pdf.extend_from_slice(b"trailer\n<< /Size 5 /Root 1 0 R >>\nstartxref\n");
        pdf.extend_from_slice(format!("{xref_pos}\n").as_bytes());
        pdf.extend_from_slice(b"%%EOF");
        pdf
    }

    #[test]
    fn loads_minimal_document_and_counts_one_page() {
        let doc = Document::load_from_bytes(Bytes::from(minimal_pdf()), DocumentOptions::default()).unwrap();
        assert_eq!(doc.page_count(), 1);
        assert!(!doc.is_encrypted());
    }

    #[test]
    fn reference_resolution_is_stable_across_calls() {
        let doc = Document::load_from_bytes(Bytes::from(minimal_pdf()), DocumentOptions::default()).unwrap();
        let a = doc.getobj_shared(2).unwrap();
        let b = doc.getobj_shared(2).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn resolving_a_free_reference_yields_null() {
        let doc = Document::load_from_bytes(Bytes::from(minimal_pdf()), DocumentOptions::default()).unwrap();
        let obj = doc.resolve(&PDFObject::Ref(PDFObjRef::new(999, 0))).unwrap();
        assert!(obj.is_null());
    }
}
