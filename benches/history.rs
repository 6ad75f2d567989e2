//! Benchmarks for history dispatch with full buffers

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use kiln::history::{
    Action, HistoryState, HistoryStore, KpiReading, LogEntry, LogLevel, KPI_HISTORY_CAPACITY,
};

fn reading(i: usize) -> KpiReading {
    let v = (i % 100) as f64;
    KpiReading {
        spc: 40.0 + v * 0.3,
        tsr: 50.0 + v * 0.2,
        clinker_quality: 85.0 + v * 0.1,
        co2: 10.0 + v * 0.05,
    }
}

fn full_store() -> HistoryStore {
    let store = HistoryStore::new();
    for i in 0..KPI_HISTORY_CAPACITY {
        store.dispatch(Action::kpi_sample(reading(i), i as i64));
        store.dispatch(Action::AddLog(LogEntry::new(
            i.to_string(),
            LogLevel::Info,
            "tick",
        )));
    }
    store
}

fn bench_store_dispatch_full(c: &mut Criterion) {
    let store = full_store();
    let mut i = KPI_HISTORY_CAPACITY;

    c.bench_function("store_dispatch_kpi_full", |b| {
        b.iter(|| {
            i += 1;
            store.dispatch(black_box(Action::kpi_sample(reading(i), i as i64)));
        });
    });
}

fn bench_store_dispatch_with_reader(c: &mut Criterion) {
    let store = full_store();
    let mut i = KPI_HISTORY_CAPACITY;

    // A held snapshot forces the reducer to clone
    c.bench_function("store_dispatch_kpi_snapshot_held", |b| {
        b.iter(|| {
            let snapshot = store.snapshot();
            i += 1;
            store.dispatch(black_box(Action::kpi_sample(reading(i), i as i64)));
            black_box(snapshot)
        });
    });
}

fn bench_reducer_apply(c: &mut Criterion) {
    let state = (*full_store().snapshot()).clone();

    c.bench_function("reducer_apply_log", |b| {
        b.iter_batched(
            || state.clone(),
            |s: HistoryState| {
                s.apply(black_box(Action::AddLog(LogEntry::new(
                    "next",
                    LogLevel::Alert,
                    "SPC above limit",
                ))))
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_kpi_cards(c: &mut Criterion) {
    let store = full_store();

    c.bench_function("kpi_cards", |b| {
        b.iter(|| black_box(store.snapshot().kpi_cards()));
    });
}

criterion_group!(
    benches,
    bench_store_dispatch_full,
    bench_store_dispatch_with_reader,
    bench_reducer_apply,
    bench_kpi_cards
);
criterion_main!(benches);
