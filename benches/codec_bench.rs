//! Performance benchmarks for specifier parsing and the SIO codecs.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench codec_bench
//! ```

use bytes::{Bytes, BytesMut};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use fujinet_core::{ErrorCode, UnitNumber};
use fujinet_protocol::{
    DeviceSpecifier, HostCommand, HostTranslator, ResponseFrame, SioCodec, SioHostTranslator,
};
use std::hint::black_box;
use tokio_util::codec::{Decoder, Encoder};

const SPECIFIERS: &[&str] = &[
    "N1:http://example.com/",
    "n8:https://api.example.com:8443/v1/items?page=2&limit=50",
    "X1:http://example.com/",
    "N9:http://example.com/",
];

fn bench_specifier_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("specifier_parse");
    group.throughput(Throughput::Elements(1));

    for input in SPECIFIERS {
        group.bench_with_input(BenchmarkId::from_parameter(input), input, |b, input| {
            b.iter(|| black_box(DeviceSpecifier::parse(black_box(input))).is_ok());
        });
    }

    group.finish();
}

fn bench_decode_command(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_command");
    let unit = UnitNumber::new(1).unwrap();

    for size in [0usize, 128, 4096] {
        let bytes = HostCommand::PostBin {
            specifier: "N1:http://example.com/upload".into(),
            data: Bytes::from(vec![0x55; size]),
        }
        .to_frame(unit)
        .to_bytes();

        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            let translator = SioHostTranslator::new();
            b.iter(|| {
                let mut codec = SioCodec::new();
                let mut buffer = BytesMut::from(bytes.as_ref());
                let frame = codec.decode(&mut buffer).unwrap().unwrap();
                black_box(translator.translate_command(&frame).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_encode_response(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_response");

    for size in [0usize, 97, 4096] {
        let payload = Bytes::from(vec![b'x'; size]);
        group.throughput(Throughput::Bytes(size as u64 + 5));
        group.bench_with_input(BenchmarkId::from_parameter(size), &payload, |b, payload| {
            b.iter(|| {
                let mut codec = SioCodec::new();
                let mut buffer = BytesMut::new();
                codec
                    .encode(
                        ResponseFrame::from_code(ErrorCode::Ok, payload.clone()),
                        &mut buffer,
                    )
                    .unwrap();
                black_box(buffer);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_specifier_parse,
    bench_decode_command,
    bench_encode_response
);
criterion_main!(benches);
