//! Benchmarks for the distal inundation engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tephra_algorithms::prelude::*;
use tephra_core::{GeoTransform, Raster};

/// A long V-shaped valley flowing east along its centre row, with gentle
/// wall undulation so sections do not all cost the same.
fn create_valley(rows: usize, cols: usize) -> (Raster<f64>, Raster<u8>) {
    let mut dem = Raster::new(rows, cols);
    dem.set_transform(GeoTransform::new(0.0, rows as f64 * 10.0, 10.0, -10.0));
    let channel = rows as f64 / 2.0;
    for row in 0..rows {
        for col in 0..cols {
            let wall = (row as f64 - channel).abs() * 4.0;
            let ripple = ((row * 7 + col * 13) % 11) as f64 * 0.05;
            dem.set(row, col, wall + ripple).unwrap();
        }
    }
    let flow = dem.with_same_meta::<u8>(FlowDir::East.code());
    (dem, flow)
}

fn bench_single_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("inundation/run_from_start");
    for size in [128usize, 256, 512] {
        let (dem, flow) = create_valley(size, size);
        let scenarios =
            ScenarioList::from_volumes(&[1.0e8, 1.0e7, 1.0e6], FlowKind::Lahar).unwrap();
        let start = StartPoint::Cell {
            row: size / 2,
            col: 1,
        };
        let params = InundationParams::default();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                run_from_start(
                    black_box(&dem),
                    black_box(&flow),
                    &scenarios,
                    start,
                    &params,
                )
                .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_multi_start(c: &mut Criterion) {
    let mut group = c.benchmark_group("inundation/distal_inundation");
    let (dem, flow) = create_valley(256, 256);
    let scenarios = ScenarioList::from_volumes(&[1.0e8, 1.0e7, 1.0e6], FlowKind::Lahar).unwrap();
    let params = InundationParams::default();

    for n_starts in [1usize, 4, 16] {
        let starts: Vec<StartPoint> = (0..n_starts)
            .map(|i| StartPoint::Cell {
                row: 128,
                col: 1 + i * 8,
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n_starts), &n_starts, |b, _| {
            b.iter(|| {
                distal_inundation(
                    black_box(&dem),
                    black_box(&flow),
                    &scenarios,
                    &starts,
                    &params,
                )
                .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single_run, bench_multi_start);
criterion_main!(benches);
