// Storage codec and key construction benchmarks.
//
// Covers decoding a peer registry batch, a nested record, compact integers,
// and building content-hashed storage keys.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use cess_query::codec::{decode, encode, Shape, TypedValue};
use cess_query::storage::items::{OSS_AUTHORITY_LIST, OSS_PEERS};

fn space_record() -> (Shape, Vec<u8>) {
    let shape: Shape = "{owner: AccountId, total_space: u128, used_space: u128, \
                        start: u32, deadline: u32, state: text}"
        .parse()
        .expect("valid shape");
    let value = TypedValue::Record(vec![
        ("owner".into(), TypedValue::Bytes(vec![7; 32])),
        ("total_space".into(), TypedValue::UInt(1 << 40)),
        ("used_space".into(), TypedValue::UInt(1 << 33)),
        ("start".into(), TypedValue::UInt(120_000)),
        ("deadline".into(), TypedValue::UInt(5_376_000)),
        ("state".into(), TypedValue::Text("normal".into())),
    ]);
    let bytes = encode(&value, &shape).expect("encodable");
    (shape, bytes)
}

fn bench_decode_record(c: &mut Criterion) {
    let (shape, bytes) = space_record();
    c.bench_function("decode/space_record", |b| {
        b.iter(|| decode(black_box(&bytes), &shape));
    });
}

fn bench_decode_peer_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode/peer_list");
    let shape = Shape::sequence(Shape::peer_id());

    for count in [10usize, 100, 1_000] {
        let value = TypedValue::Sequence(vec![TypedValue::Bytes(vec![0x24; 38]); count]);
        let bytes = encode(&value, &shape).expect("encodable");
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &bytes, |b, bytes| {
            b.iter(|| decode(black_box(bytes), &shape));
        });
    }

    group.finish();
}

fn bench_decode_compact(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode/compact");
    for value in [42u128, 1 << 20, u64::MAX as u128] {
        let bytes = encode(&TypedValue::UInt(value), &Shape::Compact).expect("encodable");
        group.bench_with_input(BenchmarkId::from_parameter(bytes.len()), &bytes, |b, bytes| {
            b.iter(|| decode(black_box(bytes), &Shape::Compact));
        });
    }
    group.finish();
}

fn bench_storage_keys(c: &mut Criterion) {
    let account = [0x42u8; 32];
    c.bench_function("key/authority_list", |b| {
        b.iter(|| OSS_AUTHORITY_LIST.address(&[black_box(&account)]));
    });
    c.bench_function("key/oss_prefix", |b| {
        b.iter(|| OSS_PEERS.prefix());
    });
}

criterion_group!(
    benches,
    bench_decode_record,
    bench_decode_peer_list,
    bench_decode_compact,
    bench_storage_keys,
);
criterion_main!(benches);
