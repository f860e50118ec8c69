//! # Codec Benchmarks
//!
//! Measures binary encoding/decoding and the per-symbol cost of each cipher.
//!
//! Run: `cargo bench --bench codec_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use telesim_codec::{binary_to_bytes, decode, decrypt, encode, encrypt};
use telesim_core::prelude::*;

fn sample_text(len: usize) -> String {
    "The quick brown fox jumps over the lazy dog. "
        .chars()
        .cycle()
        .take(len)
        .collect()
}

/// Benchmark texto → binário → texto
fn bench_binary(c: &mut Criterion) {
    let mut group = c.benchmark_group("binary");

    for len in [16, 256, 4096] {
        let text = sample_text(len);
        let binary = encode(&text).unwrap();
        group.throughput(Throughput::Bytes(len as u64));

        group.bench_with_input(BenchmarkId::new("encode", len), &text, |b, text| {
            b.iter(|| black_box(encode(text).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("decode", len), &binary, |b, binary| {
            b.iter(|| black_box(decode(binary, &text).unwrap()))
        });

        group.bench_with_input(BenchmarkId::new("to_bytes", len), &binary, |b, binary| {
            b.iter(|| black_box(binary_to_bytes(binary).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark cifra + decifra por algoritmo
fn bench_ciphers(c: &mut Criterion) {
    let mut group = c.benchmark_group("cipher_roundtrip");
    let binary = encode(&sample_text(1024)).unwrap();
    group.throughput(Throughput::Elements(binary.len() as u64));

    let configs = [
        CipherConfig::none(),
        CipherConfig::new(CipherAlgorithm::CaesarBitFlip, "3"),
        CipherConfig::new(CipherAlgorithm::Xor, "1010"),
        CipherConfig::new(CipherAlgorithm::Base64, ""),
    ];

    for config in configs {
        group.bench_with_input(
            BenchmarkId::from_parameter(config.algorithm),
            &config,
            |b, config| {
                b.iter(|| {
                    let sealed = encrypt(config, black_box(&binary)).unwrap();
                    black_box(decrypt(config, &sealed).unwrap())
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_binary, bench_ciphers);
criterion_main!(benches);
