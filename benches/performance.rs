//! Performance benchmarks for the tree codec.

use blobcodec::{FsBlobStore, Mapping, MemoryBlobStore, TreeCodec, Value};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;

/// A call event with `width` entries, every fourth one carrying audio.
fn build_event(width: usize) -> Value {
    let mut event = Mapping::new();
    for i in 0..width {
        let item = if i % 4 == 0 {
            Value::blob(vec![(i % 251) as u8; 4096])
        } else {
            let mut m = Mapping::new();
            m.insert("id", i as u64);
            m.insert("label", format!("item-{}", i));
            m.insert("tags", Value::Sequence(vec![Value::from("a"), Value::from("b")]));
            m.into()
        };
        event.insert(format!("k{}", i), item);
    }
    event.into()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for width in [10, 100, 1000] {
        let value = build_event(width);

        group.bench_with_input(BenchmarkId::new("memory", width), &value, |b, value| {
            let codec = TreeCodec::new(MemoryBlobStore::new());
            b.iter(|| black_box(codec.encode(value).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("fs", width), &value, |b, value| {
            let dir = TempDir::new().unwrap();
            let codec = TreeCodec::new(FsBlobStore::new(dir.path()).unwrap());
            b.iter(|| black_box(codec.encode(value).unwrap()));
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for width in [10, 100, 1000] {
        let dir = TempDir::new().unwrap();
        let codec = TreeCodec::new(FsBlobStore::new(dir.path()).unwrap());
        let document = codec.encode(&build_event(width)).unwrap();

        group.bench_with_input(BenchmarkId::new("fs", width), &document, |b, document| {
            b.iter(|| black_box(codec.decode(document).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
