//! Metrics Hot-Path Benchmarks
//!
//! Facade calls run inside every request handler, so they must stay in
//! the tens of nanoseconds. Snapshot rendering runs once per scrape.
//!
//! Run with: cargo bench --bench metrics_bench

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cv_metrics::domain::PredictionClass;
use cv_metrics::{Instrumentation, InstrumentationOptions, MetricRegistry};

fn facade() -> Instrumentation {
    Instrumentation::new(Arc::new(MetricRegistry::new()), InstrumentationOptions::default())
        .expect("instrument registration")
}

/// Benchmark a single inference time observation (ms → s + observe).
fn bench_track_inference_time(c: &mut Criterion) {
    let m = facade();

    c.bench_function("track_inference_time", |b| {
        b.iter(|| m.track_inference_time(black_box(42.5)));
    });
}

/// Benchmark the connectivity gauge write.
fn bench_update_db_status(c: &mut Criterion) {
    let m = facade();

    c.bench_function("update_db_status", |b| {
        b.iter(|| m.update_db_status(black_box(true)));
    });
}

/// Benchmark a labelled counter increment.
fn bench_track_prediction(c: &mut Criterion) {
    let m = facade();

    c.bench_function("track_prediction", |b| {
        b.iter(|| m.track_prediction(black_box(PredictionClass::Dog)));
    });
}

/// Benchmark rendering the full snapshot after some traffic.
fn bench_snapshot(c: &mut Criterion) {
    let m = facade();
    for i in 0..1_000 {
        m.track_inference_time(f64::from(i % 500));
        m.track_prediction(if i % 2 == 0 { PredictionClass::Cat } else { PredictionClass::Dog });
    }
    m.update_db_status(true);

    c.bench_function("snapshot_render", |b| {
        b.iter(|| black_box(m.registry().snapshot()));
    });
}

criterion_group!(
    benches,
    bench_track_inference_time,
    bench_update_db_status,
    bench_track_prediction,
    bench_snapshot,
);
criterion_main!(benches);
