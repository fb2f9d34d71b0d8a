//! Benchmarks for per-frame detection deduplication.
//!
//! Template matching yields tens of raw hits per frame, usually in tight
//! clusters around each icon. Deduplication is quadratic in the hit count,
//! so these benchmarks track its cost at realistic and pessimistic sizes.

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use framebot_core::types::{Detection, Rect};
use framebot_detect::dedupe;

/// Generate `icons` clusters of `per_icon` jittered hits, best-first.
fn clustered_hits(icons: usize, per_icon: usize) -> Vec<Detection> {
    let mut hits = Vec::with_capacity(icons * per_icon);
    for icon in 0..icons {
        let base_x = (icon as i32 % 10) * 64;
        let base_y = (icon as i32 / 10) * 64;
        for jitter in 0..per_icon {
            let dx = (jitter as i32 % 3) - 1;
            let dy = (jitter as i32 / 3 % 3) - 1;
            let rect = Rect::new(base_x + dx, base_y + dy, 48, 48).expect("valid rect");
            hits.push(Detection::new(rect, 0.99 - jitter as f64 * 0.01));
        }
    }
    // Interleave clusters the way a score-sorted match map does.
    hits.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    hits
}

fn bench_dedupe(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedupe");
    group.measurement_time(Duration::from_secs(5));

    for (icons, per_icon) in [(5, 4), (10, 6), (30, 9)] {
        let hits = clustered_hits(icons, per_icon);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}icons_{}hits", icons, hits.len())),
            &hits,
            |b, hits| {
                b.iter(|| {
                    let set = dedupe(black_box(hits.clone()), 0.7).expect("valid threshold");
                    assert_eq!(set.len(), icons);
                    set
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_dedupe);
criterion_main!(benches);
