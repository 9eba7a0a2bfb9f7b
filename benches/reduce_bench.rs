// In benches/reduce_bench.rs

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ndpack::{DataBuffer, DType, NdArray};

// --- Mock Data Generation ---

/// Builds a rank-3 float array with a deterministic ramp pattern.
fn generate_ramp_array(extent: usize) -> NdArray {
    let size = extent * extent * extent;
    let data: Vec<f64> = (0..size).map(|i| (i % 251) as f64 * 0.5).collect();
    NdArray::new(
        DataBuffer::F64(data),
        vec![extent, extent, extent],
        DType::Float64,
    )
    .unwrap()
}

// --- Benchmark Suite ---

const BENCH_EXTENT: usize = 64; // 64^3 = 262144 elements

fn bench_reductions(c: &mut Criterion) {
    let array = generate_ramp_array(BENCH_EXTENT);

    let mut group = c.benchmark_group("Axis Reductions");
    group.throughput(criterion::Throughput::Elements(
        (BENCH_EXTENT * BENCH_EXTENT * BENCH_EXTENT) as u64,
    ));

    group.bench_function("Sum (full fold)", |b| {
        b.iter(|| black_box(array.sum(None).unwrap()))
    });
    group.bench_function("Sum (middle axis)", |b| {
        b.iter(|| black_box(array.sum(Some(1)).unwrap()))
    });
    group.bench_function("Mean (middle axis)", |b| {
        b.iter(|| black_box(array.mean(Some(1)).unwrap()))
    });
    group.bench_function("Range (single pass min+max)", |b| {
        b.iter(|| black_box(array.range(Some(1)).unwrap()))
    });
    group.bench_function("Transpose (full reversal)", |b| {
        b.iter(|| black_box(array.transpose(None).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_reductions);
criterion_main!(benches);
