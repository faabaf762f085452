//! Benchmarks for accessibility scoring and change detection

use coopaccess_algorithms::accessibility::{
    compute_scores, create_ring_buffers, expand_distances, NativeGeometryEngine, NullFeedback,
    DEFAULT_MULTIPLIERS,
};
use coopaccess_algorithms::imagery::{change_detection, ChangeParams};
use coopaccess_core::{Feature, FeatureCollection, GeoTransform, Raster};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geo::{Geometry, LineString, Point};

fn cooperatives(n: usize) -> Vec<Feature> {
    (0..n)
        .map(|i| {
            let x = ((i * 7919) % 20_000) as f64;
            let y = ((i * 104_729) % 20_000) as f64;
            Feature::new(Geometry::Point(Point::new(x, y)))
        })
        .collect()
}

fn road_network(lines: usize) -> FeatureCollection {
    FeatureCollection::from_features(
        (0..lines)
            .map(|i| {
                let y = i as f64 * 20_000.0 / lines as f64;
                Feature::new(Geometry::LineString(LineString::from(vec![
                    (0.0, y),
                    (10_000.0, y + 500.0),
                    (20_000.0, y),
                ])))
            })
            .collect(),
    )
}

fn market_points(n: usize) -> FeatureCollection {
    FeatureCollection::from_features(
        (0..n)
            .map(|i| {
                let t = i as f64 / n as f64;
                Feature::new(Geometry::Point(Point::new(t * 20_000.0, (1.0 - t) * 20_000.0)))
            })
            .collect(),
    )
}

fn bench_compute_scores(c: &mut Criterion) {
    let engine = NativeGeometryEngine;
    let roads = create_ring_buffers(
        &engine,
        &road_network(10),
        &expand_distances(1000.0, &DEFAULT_MULTIPLIERS),
        5,
    )
    .unwrap();
    let markets = create_ring_buffers(
        &engine,
        &market_points(20),
        &expand_distances(2000.0, &DEFAULT_MULTIPLIERS),
        5,
    )
    .unwrap();

    let mut group = c.benchmark_group("accessibility/compute_scores");
    for n in [100, 1000, 5000] {
        let coops = cooperatives(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                compute_scores(
                    black_box(&coops),
                    &roads,
                    &markets,
                    0.6,
                    &engine,
                    &NullFeedback,
                )
                .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_ring_buffers(c: &mut Criterion) {
    let engine = NativeGeometryEngine;
    let distances = expand_distances(1000.0, &DEFAULT_MULTIPLIERS);

    let mut group = c.benchmark_group("accessibility/ring_buffers");
    for lines in [10, 100, 1000] {
        let roads = road_network(lines);
        group.bench_with_input(BenchmarkId::from_parameter(lines), &lines, |b, _| {
            b.iter(|| create_ring_buffers(&engine, black_box(&roads), &distances, 5).unwrap())
        });
    }
    group.finish();
}

fn create_classes(size: usize, shift: usize) -> Raster<u8> {
    let mut r = Raster::new(size, size);
    r.set_transform(GeoTransform::new(0.0, size as f64, 1.0, -1.0));
    for row in 0..size {
        for col in 0..size {
            r.set(row, col, (((row + shift) * 7 + col * 13) % 6) as u8).unwrap();
        }
    }
    r
}

fn bench_change_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("imagery/change_detection");
    for size in [256, 1024, 2048] {
        let before = create_classes(size, 0);
        let after = create_classes(size, 1);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                change_detection(black_box(&before), black_box(&after), ChangeParams::default())
                    .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compute_scores, bench_ring_buffers, bench_change_detection);
criterion_main!(benches);
