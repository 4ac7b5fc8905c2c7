//! Criterion benchmarks for the slot store hot path.
//!
//! Every normal copy runs `capture_to_temp`, which hashes the payload, and
//! with auto-promote enabled also `promote_temp`.  Both must stay well under
//! a millisecond so clipboard notifications never back up.
//!
//! Run with:
//! ```bash
//! cargo bench --package clipbank-core --bench slot_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use clipbank_core::{ClipboardContent, FillMode, SlotManager, SlotSettings};

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// Builds a manager with `count` slots, every other one locked.
fn build_manager(count: usize) -> SlotManager {
    let mut manager = SlotManager::new(SlotSettings {
        slot_count: count,
        fill_mode: FillMode::RoundRobin,
        ..SlotSettings::default()
    });
    for i in (1..count).step_by(2) {
        let _ = manager.toggle_lock(i);
    }
    manager
}

// ── Benchmarks: content hashing ───────────────────────────────────────────────

fn bench_content_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("content_hash");

    for &size in &[64usize, 4 * 1024, 1024 * 1024] {
        let text = "x".repeat(size);
        group.bench_with_input(BenchmarkId::new("text_bytes", size), &text, |b, t| {
            b.iter(|| ClipboardContent::text(black_box(t.clone())))
        });
    }

    // 1920x1080 32-bit bitmap
    let dib = vec![0x7Fu8; 1920 * 1080 * 4];
    group.bench_function("image_1080p", |b| {
        b.iter(|| ClipboardContent::image(1920, 1080, black_box(dib.clone())))
    });

    group.finish();
}

// ── Benchmarks: promotion ─────────────────────────────────────────────────────

fn bench_promote_round_robin(c: &mut Criterion) {
    let mut group = c.benchmark_group("promote_round_robin");

    for &count in &[10usize, 50] {
        group.bench_with_input(BenchmarkId::new("slots", count), &count, |b, &count| {
            let mut manager = build_manager(count);
            let mut n = 0u64;
            b.iter(|| {
                n += 1;
                manager.capture_to_temp(ClipboardContent::text(n.to_string()), None);
                black_box(manager.promote_temp(None))
            })
        });
    }

    group.finish();
}

fn bench_promote_duplicate(c: &mut Criterion) {
    let mut manager = build_manager(10);
    manager.capture_to_temp(ClipboardContent::text("same"), None);
    manager.promote_temp(None);

    c.bench_function("promote_duplicate", |b| {
        b.iter(|| black_box(manager.promote_temp(None)))
    });
}

criterion_group!(
    benches,
    bench_content_hash,
    bench_promote_round_robin,
    bench_promote_duplicate,
);
criterion_main!(benches);
