//! Benchmarks for time-grid normalization.

use benchmarks::daily_observations;
use common::TimeLevel;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use normalize::fill_time_grid;

fn bench_fill_dense(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_time_grid_dense");

    for entities in [10, 100, 1000] {
        let observations = daily_observations(entities, 365, 0);
        group.bench_with_input(BenchmarkId::from_parameter(entities), &observations, |b, obs| {
            b.iter(|| fill_time_grid(black_box(obs), TimeLevel::Daily))
        });
    }

    group.finish();
}

fn bench_fill_gaps(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_time_grid_gaps");

    for gap_every in [2, 5, 30] {
        let observations = daily_observations(100, 365, gap_every);
        group.bench_with_input(BenchmarkId::from_parameter(gap_every), &observations, |b, obs| {
            b.iter(|| fill_time_grid(black_box(obs), TimeLevel::Daily))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fill_dense, bench_fill_gaps);
criterion_main!(benches);
