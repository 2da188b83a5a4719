//! Benchmarks for Phi calculation and its supporting search routines.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use iit::*;

fn phi_calculation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("phi_calculation");

    for size in [2, 3, 4].iter() {
        group.bench_with_input(BenchmarkId::new("fully_connected", size), size, |b, &size| {
            let mut system = fully_connected_system(size);
            system.set_state(vec![1; size]);

            b.iter(|| {
                let result = system.calculate_phi().unwrap();
                black_box(result);
            });
        });
    }

    group.finish();
}

fn feedforward_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("feedforward_phi");

    for size in [2, 3, 4].iter() {
        group.bench_with_input(BenchmarkId::new("feedforward", size), size, |b, &size| {
            let mut system = feedforward_system(size);
            system.set_state(vec![1; size]);

            b.iter(|| {
                let result = system.calculate_phi().unwrap();
                black_box(result);
            });
        });
    }

    group.finish();
}

fn concept_identification_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("concept_identification");

    for size in [2, 3, 4].iter() {
        group.bench_with_input(BenchmarkId::new("concepts", size), size, |b, &size| {
            let mut system = fully_connected_system(size);
            system.set_state(vec![1; size]);

            b.iter(|| {
                let ces = system.identify_concepts().unwrap();
                black_box(ces);
            });
        });
    }

    group.finish();
}

fn partition_enumeration_benchmark(c: &mut Criterion) {
    use iit::partition::{all_bipartitions, CutType};

    let mut group = c.benchmark_group("partition_enumeration");

    for size in [3, 4, 5, 6, 8].iter() {
        group.bench_with_input(BenchmarkId::new("bipartitions", size), size, |b, &size| {
            b.iter(|| {
                let partitions = all_bipartitions(size, CutType::Bidirectional);
                black_box(partitions);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    phi_calculation_benchmark,
    feedforward_benchmark,
    concept_identification_benchmark,
    partition_enumeration_benchmark
);
criterion_main!(benches);
