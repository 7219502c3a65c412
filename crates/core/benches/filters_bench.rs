//! Benchmarks for the stream decoders: the critical hot path for
//! compressed content and image streams.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use pdfreed_core::codec::ascii::ascii85decode;
use pdfreed_core::codec::flate::flatedecode;
use pdfreed_core::codec::lzw::lzwdecode;
use pdfreed_core::codec::runlength::rldecode;

fn generate_raw_bytes(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

fn generate_random_bytes(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut seed: u64 = 42;
    for _ in 0..size {
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((seed >> 16) as u8);
    }
    data
}

fn ascii85_encode(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len() * 5 / 4 + 10);
    result.extend_from_slice(b"<~");
    for chunk in data.chunks(4) {
        let mut padded = [0u8; 4];
        padded[..chunk.len()].copy_from_slice(chunk);
        let value = u32::from_be_bytes(padded);
        let mut encoded = [0u8; 5];
        let mut v = value;
        for i in (0..5).rev() {
            encoded[i] = (v % 85) as u8 + b'!';
            v /= 85;
        }
        if chunk.len() == 4 && value == 0 {
            result.push(b'z');
        } else {
            result.extend_from_slice(&encoded[..chunk.len() + 1]);
        }
    }
    result.extend_from_slice(b"~>");
    result
}

fn lzw_encode(data: &[u8]) -> Vec<u8> {
    use weezl::{encode::Encoder, BitOrder};
    Encoder::new(BitOrder::Msb, 8).encode(data).expect("LZW encoding should succeed for benchmark data")
}

fn runlength_encode(data: &[u8]) -> Vec<u8> {
    if data.is_empty() {
        return vec![128];
    }
    let mut result = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let byte = data[i];
        let mut run_len = 1;
        while i + run_len < data.len() && data[i + run_len] == byte && run_len < 128 {
            run_len += 1;
        }
        if run_len >= 2 {
            result.push((257 - run_len) as u8);
            result.push(byte);
            i += run_len;
        } else {
            let start = i;
            let mut lit_len = 1;
            while i + lit_len < data.len() && lit_len < 128 {
                let next_byte = data[i + lit_len];
                let next_run =
                    if i + lit_len + 1 < data.len() && data[i + lit_len + 1] == next_byte { 2 } else { 1 };
                if next_run >= 2 {
                    break;
                }
                lit_len += 1;
            }
            result.push((lit_len - 1) as u8);
            result.extend_from_slice(&data[start..start + lit_len]);
            i += lit_len;
        }
    }
    result.push(128);
    result
}

fn flate_encode(data: &[u8]) -> Vec<u8> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

struct TestData {
    ascii85: Vec<(&'static str, Vec<u8>)>,
    lzw: Vec<(&'static str, Vec<u8>)>,
    runlength: Vec<(&'static str, Vec<u8>)>,
    flate: Vec<(&'static str, Vec<u8>)>,
}

impl TestData {
    fn new() -> Self {
        let sizes = [("1K", 1024usize), ("10K", 10 * 1024), ("100K", 100 * 1024)];
        let raw: Vec<(&str, Vec<u8>)> = sizes.iter().map(|(n, s)| (*n, generate_raw_bytes(*s))).collect();
        Self {
            ascii85: raw.iter().map(|(n, d)| (*n, ascii85_encode(d))).collect(),
            lzw: raw.iter().map(|(n, d)| (*n, lzw_encode(d))).collect(),
            runlength: raw.iter().map(|(n, d)| (*n, runlength_encode(d))).collect(),
            flate: raw.iter().map(|(n, d)| (*n, flate_encode(d))).collect(),
        }
    }
}

fn bench_ascii85(c: &mut Criterion) {
    let data = TestData::new();
    let mut group = c.benchmark_group("filters_ascii85");
    for (name, encoded) in &data.ascii85 {
        group.bench_with_input(BenchmarkId::from_parameter(name), encoded, |b, encoded| {
            b.iter(|| ascii85decode(black_box(encoded)))
        });
    }
    group.finish();
}

fn bench_lzw(c: &mut Criterion) {
    let data = TestData::new();
    let mut group = c.benchmark_group("filters_lzw");
    for (name, encoded) in &data.lzw {
        group.bench_with_input(BenchmarkId::from_parameter(name), encoded, |b, encoded| {
            b.iter(|| lzwdecode(black_box(encoded)))
        });
    }
    group.finish();
}

fn bench_runlength(c: &mut Criterion) {
    let data = TestData::new();
    let mut group = c.benchmark_group("filters_runlength");
    for (name, encoded) in &data.runlength {
        group.bench_with_input(BenchmarkId::from_parameter(name), encoded, |b, encoded| {
            b.iter(|| rldecode(black_box(encoded)))
        });
    }
    group.finish();
}

fn bench_flate(c: &mut Criterion) {
    let data = TestData::new();
    let mut group = c.benchmark_group("filters_flate");
    for (name, encoded) in &data.flate {
        group.bench_with_input(BenchmarkId::from_parameter(name), encoded, |b, encoded| {
            b.iter(|| flatedecode(black_box(encoded)))
        });
    }
    group.finish();
}

fn bench_chained(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters_chained");
    let raw_10k = generate_raw_bytes(10 * 1024);

    let lzw_compressed = lzw_encode(&raw_10k);
    let ascii85_lzw = ascii85_encode(&lzw_compressed);
    group.bench_function("ascii85_then_lzw_10K", |b| {
        b.iter(|| {
            let intermediate = ascii85decode(black_box(&ascii85_lzw)).unwrap();
            lzwdecode(black_box(&intermediate))
        })
    });

    let rl_lzw = runlength_encode(&lzw_compressed);
    group.bench_function("runlength_then_lzw_10K", |b| {
        b.iter(|| {
            let intermediate = rldecode(black_box(&rl_lzw)).unwrap();
            lzwdecode(black_box(&intermediate))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_ascii85, bench_lzw, bench_runlength, bench_flate, bench_chained);
criterion_main!(benches);
