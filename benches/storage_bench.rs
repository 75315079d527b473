//! Benchmarks for quantastore storage operations

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use quantastore::{Config, Store};

fn fill_device(store: &Store, bytes: usize) {
    let device = store.device(0).unwrap();
    let data = vec![0xabu8; bytes];
    let mut done = 0;
    while done < bytes {
        done += device.write_at(done as u64, &&data[done..]).unwrap();
    }
}

fn storage_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantum_io");
    group.throughput(Throughput::Bytes(4000));

    group.bench_function("write_one_quantum", |b| {
        let store = Store::with_defaults().unwrap();
        let device = store.device(0).unwrap();
        let data = vec![0x5au8; 4000];
        b.iter(|| {
            let n = device.write_at(0, &data.as_slice()).unwrap();
            black_box(n)
        });
    });

    group.bench_function("read_one_quantum", |b| {
        let store = Store::with_defaults().unwrap();
        fill_device(&store, 4000);
        let device = store.device(0).unwrap();
        let mut buf = vec![0u8; 4000];
        b.iter(|| {
            let n = device.read_at(0, &mut buf.as_mut_slice()).unwrap();
            black_box(n)
        });
    });

    group.finish();

    c.bench_function("sequential_fill_1mb_then_trim", |b| {
        let store = Store::new(Config::builder().quantum(4096).qset(64).build()).unwrap();
        b.iter(|| {
            fill_device(&store, 1024 * 1024);
            store.device(0).unwrap().trim();
        });
    });

    c.bench_function("sparse_write_far_offset", |b| {
        let store = Store::with_defaults().unwrap();
        let device = store.device(0).unwrap();
        b.iter(|| {
            // Lands deep in the chain; every call re-walks the arena
            let n = device.write_at(100_000_000, &b"x".as_slice()).unwrap();
            device.trim();
            black_box(n)
        });
    });
}

criterion_group!(benches, storage_benchmarks);
criterion_main!(benches);
