//! Benchmarks for cross-reference loading: the classic table form, the
//! compressed stream form, and the recovery scan fallback, at a range of
//! object-table sizes.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use pdfreed_core::document::xref::{find_startxref, CrossRefIndex};

/// Builds a minimal single-section PDF with a classic table-form xref and
/// `n` one-line objects, returning the full file bytes.
fn build_table_xref_pdf(n: u32) -> Vec<u8> {
    let mut pdf = Vec::new();
    pdf.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(n as usize);

    for i in 1..=n {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{i} 0 obj\n<< /N {i} >>\nendobj\n").as_bytes());
    }

    let xref_pos = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", n + 1).as_bytes());
    for off in &offsets {
        pdf.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(format!("trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n", n + 1).as_bytes());
    pdf.extend_from_slice(format!("{xref_pos}\n").as_bytes());
    pdf.extend_from_slice(b"%%EOF");
    pdf
}

fn bench_load_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("xref_load_chain");
    for n in [10u32, 100, 1_000] {
        let pdf = build_table_xref_pdf(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &pdf, |b, pdf| {
            b.iter(|| {
                let pos = find_startxref(black_box(pdf)).unwrap();
                CrossRefIndex::load_chain(black_box(pdf), pos)
            })
        });
    }
    group.finish();
}

fn bench_recover(c: &mut Criterion) {
    let mut group = c.benchmark_group("xref_recovery_scan");
    for n in [10u32, 100, 1_000] {
        let mut pdf = build_table_xref_pdf(n);
        // Corrupt the xref table's start offset, forcing a recovery scan.
        let len = pdf.len();
        pdf.truncate(len.saturating_sub(40));
        group.bench_with_input(BenchmarkId::from_parameter(n), &pdf, |b, pdf| {
            b.iter(|| CrossRefIndex::recover(black_box(pdf)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_load_chain, bench_recover);
criterion_main!(benches);
