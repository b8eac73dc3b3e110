use chrono::{Duration, NaiveDate, NaiveDateTime};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::Rng;

use stats::aggregator::rollup::{Rollup, WindowBounds};

pub fn criterion_benchmark(c: &mut Criterion) {
    let now = NaiveDate::from_ymd_opt(2024, 6, 15)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let bounds = WindowBounds::at(now);

    let mut group = c.benchmark_group("rollup");
    for p in [(1_000, 50), (10_000, 500), (100_000, 5_000), (1_000_000, 20_000)].iter() {
        let likes = generate_events(now, p.0, p.1);
        let comments = generate_events(now, p.0 / 4, p.1);
        group.bench_function(BenchmarkId::new("from_events", p.0), |b| {
            b.iter(|| Rollup::from_events(bounds, &likes, &comments))
        });
    }
    group.finish();
}

fn generate_events(now: NaiveDateTime, n: usize, articles: i32) -> Vec<(i32, NaiveDateTime)> {
    let mut rng = rand::rng();
    (0..n)
        .map(|_| {
            let article_id = rng.random_range(1..=articles);
            let minutes_ago = rng.random_range(0..60 * 24 * 60);
            (article_id, now - Duration::minutes(minutes_ago))
        })
        .collect()
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
