//! Benchmarks for respkv codec operations

use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use respkv::protocol::{marshal, Decoder};
use respkv::Value;

fn set_request() -> Value {
    Value::command(["SET", "user:1000:name", "a moderately sized value for benchmarking"])
}

fn codec_benchmarks(c: &mut Criterion) {
    let request = set_request();
    let wire = marshal(&request);

    c.bench_function("marshal_set", |b| b.iter(|| marshal(black_box(&request))));

    c.bench_function("parse_set", |b| {
        b.iter(|| {
            Decoder::new(Cursor::new(black_box(&wire[..])))
                .decode()
                .unwrap()
        })
    });

    // A replay-sized stream: 1000 back-to-back records
    let stream: Vec<u8> = (0..1000).flat_map(|_| wire.iter().copied()).collect();
    c.bench_function("parse_1000_records", |b| {
        b.iter(|| Decoder::new(Cursor::new(black_box(&stream[..]))).count())
    });
}

criterion_group!(benches, codec_benchmarks);
criterion_main!(benches);
