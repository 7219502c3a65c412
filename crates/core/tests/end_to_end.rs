//! End-to-end scenarios exercising `Document`/`Page` against small,
//! hand-built PDF fixtures: loading, page geometry, content interpretation,
//! filter/predictor decoding, password-protected documents, and recovery
//! from a corrupted cross-reference table.

use bytes::Bytes;
use pdfreed_core::interp::{NeverPause, PageElement, PathSegment};
use pdfreed_core::{Document, DocumentOptions};

/// Builds a classic-xref, single-section PDF from a list of `(objid, body)`
/// pairs plus a trailer dict body (without the enclosing `<< >>`).
fn build_pdf(objects: &[(u32, Vec<u8>)], trailer_extra: &str) -> Vec<u8> {
    let mut pdf = Vec::new();
    pdf.extend_from_slice(b"%PDF-1.4\n");
    let max_id = objects.iter().map(|(id, _)| *id).max().unwrap_or(0);
    let mut offsets = vec![None; (max_id + 1) as usize];

    for (id, body) in objects {
        offsets[*id as usize] = Some(pdf.len());
        pdf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
        pdf.extend_from_slice(body);
        pdf.extend_from_slice(b"\nendobj\n");
    }

    let xref_pos = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", max_id + 1).as_bytes());
    for off in &offsets[1..] {
        match off {
            Some(o) => pdf.extend_from_slice(format!("{o:010} 00000 n \n").as_bytes()),
            None => pdf.extend_from_slice(b"0000000000 00000 f \n"),
        }
    }
    pdf.extend_from_slice(format!("trailer\n<< /Size {} {} >>\nstartxref\n", max_id + 1, trailer_extra).as_bytes());
    pdf.extend_from_slice(format!("{xref_pos}\n").as_bytes());
    pdf.extend_from_slice(b"%%EOF");
    pdf
}

fn one_page_pdf(content: &[u8]) -> Vec<u8> {
    let objects: Vec<(u32, Vec<u8>)> = vec![
        (1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()),
        (2, b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec()),
        (
            3,
            b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << >> >>".to_vec(),
        ),
        (4, {
            let mut body = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
            body.extend_from_slice(content);
            body.extend_from_slice(b"\nendstream");
            body
        }),
    ];
    build_pdf(&objects, "/Root 1 0 R")
}

// Scenario 1: minimal one-page document, default MediaBox, no content.
#[test]
fn minimal_document_has_one_default_sized_page() {
    let pdf = one_page_pdf(b"");
    let doc = Document::load_from_bytes(Bytes::from(pdf), DocumentOptions::default()).unwrap();
    assert_eq!(doc.page_count(), 1);

    let page = doc.page(0).unwrap();
    let (x0, y0, x1, y1) = page.media_box();
    assert_eq!((x1 - x0, y1 - y0), (612.0, 792.0));

    let mut elements: Vec<PageElement> = Vec::new();
    page.interpret(&mut elements, &mut NeverPause).unwrap();
    assert!(elements.is_empty());
}

// Scenario 2: a filled rectangle followed by a stroked one, in document order.
#[test]
fn fill_then_stroke_emit_elements_in_order() {
    let content = b"10 20 100 50 re f\n200 300 80 80 re S\n";
    let pdf = one_page_pdf(content);
    let doc = Document::load_from_bytes(Bytes::from(pdf), DocumentOptions::default()).unwrap();
    let page = doc.page(0).unwrap();

    let mut elements: Vec<PageElement> = Vec::new();
    page.interpret(&mut elements, &mut NeverPause).unwrap();

    assert_eq!(elements.len(), 2);
    match &elements[0] {
        PageElement::FilledPath { segments, .. } => {
            assert!(segments.iter().any(|s| matches!(s, PathSegment::MoveTo(10.0, 20.0))));
        }
        other => panic!("expected FilledPath first, got {other:?}"),
    }
    match &elements[1] {
        PageElement::StrokedPath { segments, .. } => {
            assert!(segments.iter().any(|s| matches!(s, PathSegment::MoveTo(200.0, 300.0))));
        }
        other => panic!("expected StrokedPath second, got {other:?}"),
    }
}

// Scenario 3: FlateDecode with a PNG (Up/None) predictor unwraps to the
// original bytes. 4 rows of 4 zero bytes, each prefixed by a filter-type
// byte of 0 (None), zlib-compressed.
#[test]
fn flate_with_png_predictor_round_trips_to_zero_bytes() {
    let compressed: Vec<u8> = vec![120, 218, 99, 96, 192, 4, 0, 0, 20, 0, 1];
    let objects: Vec<(u32, Vec<u8>)> = vec![
        (1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()),
        (2, b"<< /Type /Pages /Kids [] /Count 0 >>".to_vec()),
        (3, {
            let mut body = format!(
                "<< /Length {} /Filter /FlateDecode /DecodeParms << /Predictor 15 /Columns 4 /Colors 1 /BitsPerComponent 8 >> >>\nstream\n",
                compressed.len()
            )
            .into_bytes();
            body.extend_from_slice(&compressed);
            body.extend_from_slice(b"\nendstream");
            body
        }),
    ];
    let pdf = build_pdf(&objects, "/Root 1 0 R");
    let doc = Document::load_from_bytes(Bytes::from(pdf), DocumentOptions::default()).unwrap();

    let stream_obj = doc.getobj(3).unwrap();
    let stream = stream_obj.as_stream().unwrap();
    let decoded = doc.decode_stream(stream).unwrap();
    assert_eq!(decoded, vec![0u8; 16]);
}

// Scenario 4: Standard security V2/R3, owner-encrypted, user password
// "user". Decrypting a string object yields "Hello". The key material
// below was derived offline following Algorithm 3.2/3.4/3.5 exactly as
// `document::security` implements them, for a fixed O/P/ID and password.
#[test]
fn encrypted_document_decrypts_with_correct_user_password() {
    let docid_hex = "0102030405060708090a0b0c0d0e0f10";
    let o_hex = "aa".repeat(32);
    let u_hex = "85c5a558650126a21604048c0cdf4b1f85c5a558650126a21604048c0cdf4b1f";
    let encrypted_hello_hex = "a7a4213d28";

    let objects: Vec<(u32, Vec<u8>)> = vec![
        (1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()),
        (2, b"<< /Type /Pages /Kids [] /Count 0 >>".to_vec()),
        (5, format!("<{encrypted_hello_hex}>").into_bytes()),
        (
            6,
            format!(
                "<< /Filter /Standard /V 2 /R 3 /Length 128 /O <{o_hex}> /U <{u_hex}> /P -44 >>"
            )
            .into_bytes(),
        ),
    ];
    let trailer_extra = format!("/Root 1 0 R /Encrypt 6 0 R /ID [<{docid_hex}> <{docid_hex}>]");
    let pdf = build_pdf(&objects, &trailer_extra);

    let options = DocumentOptions::builder().password("user").build();
    let doc = Document::load_from_bytes(Bytes::from(pdf), options).unwrap();
    assert!(doc.is_encrypted());

    let obj = doc.getobj(5).unwrap();
    assert_eq!(obj.as_string().unwrap(), b"Hello");
}

#[test]
fn encrypted_document_rejects_wrong_password() {
    let docid_hex = "0102030405060708090a0b0c0d0e0f10";
    let o_hex = "aa".repeat(32);
    let u_hex = "85c5a558650126a21604048c0cdf4b1f85c5a558650126a21604048c0cdf4b1f";

    let objects: Vec<(u32, Vec<u8>)> = vec![
        (1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()),
        (2, b"<< /Type /Pages /Kids [] /Count 0 >>".to_vec()),
        (
            6,
            format!(
                "<< /Filter /Standard /V 2 /R 3 /Length 128 /O <{o_hex}> /U <{u_hex}> /P -44 >>"
            )
            .into_bytes(),
        ),
    ];
    let trailer_extra = format!("/Root 1 0 R /Encrypt 6 0 R /ID [<{docid_hex}> <{docid_hex}>]");
    let pdf = build_pdf(&objects, &trailer_extra);

    let options = DocumentOptions::builder().password("wrong").build();
    assert!(Document::load_from_bytes(Bytes::from(pdf), options).is_err());
}

// Scenario 5: a corrupted startxref/table still loads via the recovery scan.
#[test]
fn corrupt_xref_table_recovers_via_object_scan() {
    let pdf = one_page_pdf(b"");
    let mut corrupt = pdf.clone();
    // Shift every recorded offset by +5 so the table points past each
    // object's `N 0 obj` header, forcing every table lookup to miss.
    if let Some(pos) = corrupt.windows(4).position(|w| w == b"xref") {
        let after = pos + 5;
        for b in corrupt[after..after + 200].iter_mut() {
            if b.is_ascii_digit() {
                *b = b'9';
            }
        }
    }

    let doc = Document::load_from_bytes(Bytes::from(corrupt), DocumentOptions::default()).unwrap();
    let page = doc.page(0).unwrap();
    let (x0, y0, x1, y1) = page.media_box();
    assert_eq!((x1 - x0, y1 - y0), (612.0, 792.0));
}

// Scenario 6: nested q/Q balance leaves no drawing output and doesn't panic
// on the final, deepest restore.
#[test]
fn nested_save_restore_is_balanced_and_silent() {
    let content = b"q 2 0 0 2 0 0 cm q 1 0 0 1 50 50 cm Q Q\n";
    let pdf = one_page_pdf(content);
    let doc = Document::load_from_bytes(Bytes::from(pdf), DocumentOptions::default()).unwrap();
    let page = doc.page(0).unwrap();

    let mut elements: Vec<PageElement> = Vec::new();
    page.interpret(&mut elements, &mut NeverPause).unwrap();
    assert!(elements.is_empty());
}

// Reference identity: resolving the same indirect reference twice from a
// `Document` yields the identical cached instance.
#[test]
fn repeated_object_ids_share_one_cached_instance() {
    let pdf = one_page_pdf(b"");
    let doc = Document::load_from_bytes(Bytes::from(pdf), DocumentOptions::default()).unwrap();
    let a = doc.getobj(2).unwrap();
    let b = doc.getobj(2).unwrap();
    assert!(std::sync::Arc::ptr_eq(&a, &b));
}

// Unknown operators in a content stream are skipped rather than aborting
// interpretation of the rest of the stream.
#[test]
fn unknown_operator_is_skipped_not_fatal() {
    let content = b"10 20 100 50 re f\nq 1 2 3 zzzz Q\n200 300 80 80 re S\n";
    let pdf = one_page_pdf(content);
    let doc = Document::load_from_bytes(Bytes::from(pdf), DocumentOptions::default()).unwrap();
    let page = doc.page(0).unwrap();

    let mut elements: Vec<PageElement> = Vec::new();
    page.interpret(&mut elements, &mut NeverPause).unwrap();
    assert_eq!(elements.len(), 2);
}
