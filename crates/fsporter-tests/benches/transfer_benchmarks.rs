//! Transfer engine benchmarks
//!
//! Measures the orchestration overhead of tree copies over the memory
//! backend, single-entry transfers, and the raw buffer primitives the
//! I/O layer is built on.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};

use fsporter_engine::{TransferEngine, TransferRequest};
use fsporter_fs::MemoryFileSystem;
use fsporter_io::NativeBuffer;
use fsporter_tests::test_utils::patterned_data;
use fsporter_types::{CopyOptions, Operation, PathDescriptor};

fn copy_request(source: &str, destination: &str) -> TransferRequest {
    TransferRequest::with_descriptors(
        PathDescriptor::long_full(source),
        PathDescriptor::long_full(destination),
        Operation::Copy(CopyOptions::new()),
    )
}

/// Build a memory backend holding `files` small files spread over ten
/// directories
fn seeded_engine(files: u32) -> TransferEngine<MemoryFileSystem> {
    let fs = MemoryFileSystem::new();
    let payload = patterned_data(256);
    for i in 0..files {
        fs.add_file(format!("/src/dir{}/file{i}.bin", i % 10), &payload);
    }
    TransferEngine::with_filesystem(fs)
}

/// Benchmark tree copies of increasing entry counts
fn benchmark_tree_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_tree_copy");

    for files in [10u32, 100, 1000] {
        group.throughput(Throughput::Elements(u64::from(files)));
        group.bench_with_input(BenchmarkId::from_parameter(files), &files, |b, &files| {
            b.iter_batched(
                || seeded_engine(files),
                |engine| {
                    let request = copy_request("/src", "/dst");
                    black_box(engine.execute(&request).unwrap())
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Benchmark one-shot file copies of increasing sizes
fn benchmark_single_file_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_file_copy");

    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let fs = MemoryFileSystem::new();
                    fs.add_file("/src.bin", &patterned_data(size));
                    TransferEngine::with_filesystem(fs)
                },
                |engine| {
                    let request = copy_request("/src.bin", "/dst.bin");
                    black_box(engine.execute(&request).unwrap())
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

/// Benchmark the raw buffer in/out roundtrip
fn benchmark_buffer_roundtrip(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer_roundtrip");

    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let payload = patterned_data(size);
            let mut readback = vec![0u8; size];
            b.iter(|| {
                let mut buffer = NativeBuffer::allocate(size).unwrap();
                buffer.copy_in(&payload, 0).unwrap();
                buffer.copy_out(&mut readback, 0, size).unwrap();
                black_box(readback[0])
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_tree_copy,
    benchmark_single_file_copy,
    benchmark_buffer_roundtrip
);
criterion_main!(benches);
